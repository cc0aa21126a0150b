use std::net::SocketAddr;

use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::{routes, startup, state::AppState};

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }
}

/// Fresh seeded in-memory store behind a real listener on a random port.
async fn start_server(seed: bool) -> anyhow::Result<TestApp> {
    let mut cfg = configs::AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.seed.enabled = seed;
    let customers = startup::build_customers(&cfg).await?;

    let app: Router = routes::build_router(AppState::new(customers), cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_public_health_and_openapi() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let res = client().get(app.url("/health")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");

    let doc = client().get(app.url("/api-docs/openapi.json")).send().await?.json::<Value>().await?;
    let not_found = &doc["paths"]["/api/customers/{id}"]["get"]["responses"]["404"];
    let schema = &not_found["content"]["application/json"]["schema"]["$ref"];
    assert_eq!(schema, "#/components/schemas/ErrorDoc");
    Ok(())
}

#[tokio::test]
async fn e2e_rest_crud_flow() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let c = client();

    let all = c.get(app.url("/api/customers")).send().await?.json::<Vec<Value>>().await?;
    let names: Vec<_> = all.iter().map(|v| v["name"].as_str().unwrap_or_default()).collect();
    assert_eq!(names, vec!["momo", "moha", "zakia", "ali"]);

    let res = c.get(app.url("/api/customers/search?name=MO")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.json::<Vec<Value>>().await?.len(), 2);

    let res = c
        .post(app.url("/api/customers"))
        .json(&json!({"id": 1, "name": "Titi", "email": "titi@gmail.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created = res.json::<Value>().await?;
    assert_eq!(created["id"], 5);

    let res = c
        .put(app.url("/api/customers/3"))
        .json(&json!({"name": "Zakia", "email": "zakia.zakia@gmail.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let fetched = c.get(app.url("/api/customers/3")).send().await?.json::<Value>().await?;
    assert_eq!(fetched, json!({"id": 3, "name": "Zakia", "email": "zakia.zakia@gmail.com"}));

    let res = c.delete(app.url("/api/customers/1")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);
    let res = c.get(app.url("/api/customers/1")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Customer not found with ID: 1");
    assert_eq!(body["status"], 404);
    Ok(())
}

#[tokio::test]
async fn e2e_rest_errors() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let c = client();

    let res = c
        .post(app.url("/api/customers"))
        .json(&json!({"name": "x", "email": "bad-email"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Validation Error");
    let fields: Vec<_> = body["violations"]
        .as_array()
        .map(|v| v.iter().map(|x| x["field"].clone()).collect())
        .unwrap_or_default();
    assert_eq!(fields, vec![json!("name"), json!("email")]);

    let res = c.put(app.url("/api/customers/99")).json(&json!({"name": "Nobody"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    let res = c.delete(app.url("/api/customers/99")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    let res = c.get(app.url("/api/customers/search?name=zz")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_rest_undecodable_requests_use_json_errors() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let c = client();

    let wrong_type = c
        .post(app.url("/api/customers"))
        .json(&json!({"name": 5, "email": "a@b.com"}))
        .send()
        .await?;
    let malformed = c
        .post(app.url("/api/customers"))
        .header("content-type", "application/json")
        .body("{nope")
        .send()
        .await?;
    let bad_id = c.get(app.url("/api/customers/abc")).send().await?;
    let no_name = c.get(app.url("/api/customers/search")).send().await?;

    for res in [wrong_type, malformed, bad_id, no_name] {
        assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST, "{}", res.url());
        let body = res.json::<Value>().await?;
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Bad Request");
        assert!(body["message"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn e2e_empty_store_lists_not_found() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let res = client().get(app.url("/api/customers")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "No customers found.");
    Ok(())
}

#[tokio::test]
async fn e2e_graphql() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let c = client();

    let body = c
        .post(app.url("/graphql"))
        .json(&json!({"query": "{ customerById(id: 2) { id name email } }"}))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(body["data"]["customerById"]["name"], "moha");

    let body = c
        .post(app.url("/graphql"))
        .json(&json!({
            "query": "mutation($c: CustomerInput!) { saveCustomer(customer: $c) { id } }",
            "variables": {"c": {"name": "x", "email": "bad-email"}}
        }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(body["errors"][0]["extensions"]["classification"], "BAD_REQUEST");

    let res = c.get(app.url("/graphql")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_soap() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let c = client();
    let envelope = |body: &str| {
        format!(
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" \
             xmlns:ns=\"http://soap.api.customerhub/\">\
             <soapenv:Body>{body}</soapenv:Body></soapenv:Envelope>"
        )
    };

    let res = c
        .post(app.url("/CustomerSoapService"))
        .header("content-type", "text/xml")
        .body(envelope("<ns:customerById><id>4</id></ns:customerById>"))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let xml = res.text().await?;
    assert!(xml.contains("<name>ali</name>"));

    let res = c
        .post(app.url("/CustomerSoapService"))
        .body(envelope("<ns:customerById><id>40</id></ns:customerById>"))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let xml = res.text().await?;
    assert!(xml.contains("<faultcode>soap:Client</faultcode>"));
    assert!(xml.contains("<errorCode>NOT_FOUND</errorCode>"));

    let res = c
        .post(app.url("/CustomerSoapService"))
        .header("content-type", "text/xml")
        .body(vec![0xff_u8, 0xfe, b'<'])
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let xml = res.text().await?;
    assert!(xml.contains("<errorCode>BAD_REQUEST</errorCode>"));
    Ok(())
}
