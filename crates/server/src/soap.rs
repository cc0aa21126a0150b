//! SOAP 1.1 document/literal adapter on `POST /CustomerSoapService`.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use quick_xml::{escape::escape, events::Event, Reader};
use service::customer::{Customer, CustomerId, CustomerInput};
use service::errors::{ErrorKind, ServiceError};
use tracing::{error, warn};

use crate::state::{AppState, Customers};

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SERVICE_NS: &str = "http://soap.api.customerhub/";

const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Operation element and its parameters, keyed by path below the operation
/// (`id`, `name`, `customer/name`, `customer/email`).
#[derive(Debug, Default)]
pub struct SoapRequest {
    pub operation: String,
    params: HashMap<String, String>,
}

impl SoapRequest {
    pub fn param(&self, path: &str) -> Option<&str> {
        self.params.get(path).map(String::as_str)
    }

    fn id(&self) -> Result<CustomerId, SoapFault> {
        let raw = self.param("id").ok_or_else(|| SoapFault::bad_request("missing <id>"))?;
        raw.trim().parse().map_err(|_| SoapFault::bad_request(format!("invalid <id>: {raw}")))
    }

    fn name(&self) -> Result<&str, SoapFault> {
        self.param("name").ok_or_else(|| SoapFault::bad_request("missing <name>"))
    }

    fn customer(&self) -> Result<CustomerInput, SoapFault> {
        if self.param("customer").is_none() {
            return Err(SoapFault::bad_request("missing <customer>"));
        }
        Ok(CustomerInput {
            name: self.param("customer/name").map(str::to_string),
            email: self.param("customer/email").map(str::to_string),
        })
    }
}

/// Decode a raw request body and parse it as an envelope.
pub fn parse_body(body: &[u8]) -> Result<SoapRequest, SoapFault> {
    let xml = std::str::from_utf8(body)
        .map_err(|e| SoapFault::bad_request(format!("request body is not UTF-8: {e}")))?;
    parse_request(xml)
}

fn malformed(e: impl std::fmt::Display) -> SoapFault {
    SoapFault::bad_request(format!("malformed XML: {e}"))
}

/// Parse an envelope; the first child of `Body` names the operation.
pub fn parse_request(xml: &str) -> Result<SoapRequest, SoapFault> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    // depth of the Body element once seen
    let mut body_depth: Option<usize> = None;
    let mut request = SoapRequest::default();
    let mut done = false;

    loop {
        let event = reader.read_event().map_err(malformed)?;
        match &event {
            Event::Start(e) | Event::Empty(e) if !done => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match body_depth {
                    None if name == "Body" => body_depth = Some(stack.len() + 1),
                    Some(depth) if stack.len() == depth && request.operation.is_empty() => {
                        request.operation = name.clone();
                        done = is_empty;
                    }
                    Some(depth) if stack.len() > depth && !request.operation.is_empty() => {
                        let mut path = stack[depth + 1..].join("/");
                        if !path.is_empty() {
                            path.push('/');
                        }
                        path.push_str(&name);
                        request.params.entry(path).or_default();
                    }
                    _ => {}
                }
                if !is_empty {
                    stack.push(name);
                }
            }
            Event::Text(t) if !done => {
                let text = t.unescape().map_err(malformed)?;
                append_text(&mut request, &stack, body_depth, &text);
            }
            Event::CData(c) if !done => {
                let text = std::str::from_utf8(c).map_err(malformed)?;
                append_text(&mut request, &stack, body_depth, text);
            }
            Event::End(_) => {
                stack.pop();
                if let Some(depth) = body_depth {
                    if !request.operation.is_empty() && stack.len() == depth {
                        done = true;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if body_depth.is_none() {
        return Err(SoapFault::bad_request("missing soap:Body"));
    }
    if request.operation.is_empty() {
        return Err(SoapFault::bad_request("empty soap:Body"));
    }
    Ok(request)
}

/// Text below the operation element belongs to the innermost open parameter.
fn append_text(request: &mut SoapRequest, stack: &[String], body_depth: Option<usize>, text: &str) {
    if let Some(depth) = body_depth {
        if stack.len() > depth + 1 {
            let path = stack[depth + 1..].join("/");
            request.params.entry(path).or_default().push_str(text);
        }
    }
}

/// A `soap:Fault` ready to be rendered.
#[derive(Debug)]
pub struct SoapFault {
    pub code: &'static str,
    pub error_code: &'static str,
    pub message: String,
    pub violations: Vec<(String, String)>,
}

impl SoapFault {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "soap:Client",
            error_code: "BAD_REQUEST",
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let mut detail = format!("<errorCode>{}</errorCode>", self.error_code);
        for (field, message) in &self.violations {
            detail.push_str(&format!(
                "<violation field=\"{}\">{}</violation>",
                escape(field.as_str()),
                escape(message.as_str())
            ));
        }
        envelope(&format!(
            "<soap:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring>\
             <detail>{}</detail></soap:Fault>",
            self.code,
            escape(self.message.as_str()),
            detail
        ))
    }
}

impl From<ServiceError> for SoapFault {
    fn from(e: ServiceError) -> Self {
        let kind = e.kind();
        let code = match kind {
            ErrorKind::Internal => {
                error!(error = %e, "soap request failed");
                "soap:Server"
            }
            _ => "soap:Client",
        };
        let violations = e
            .violations()
            .map(|v| v.iter().map(|x| (x.field.clone(), x.message.clone())).collect())
            .unwrap_or_default();
        Self { code, error_code: kind.as_str(), message: e.public_message(), violations }
    }
}

impl IntoResponse for SoapFault {
    fn into_response(self) -> Response {
        let headers = [(header::CONTENT_TYPE, CONTENT_TYPE)];
        (StatusCode::INTERNAL_SERVER_ERROR, headers, self.render()).into_response()
    }
}

fn envelope(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soap:Envelope xmlns:soap=\"{SOAP_ENV_NS}\"><soap:Body>{body}</soap:Body></soap:Envelope>"
    )
}

fn render_customer(c: &Customer) -> String {
    format!(
        "<return><id>{}</id><name>{}</name><email>{}</email></return>",
        c.id,
        escape(c.name.as_str()),
        escape(c.email.as_str())
    )
}

fn render_response(operation: &str, returns: &[Customer]) -> String {
    let inner: String = returns.iter().map(render_customer).collect();
    envelope(&format!(
        "<ns:{operation}Response xmlns:ns=\"{SERVICE_NS}\">{inner}</ns:{operation}Response>"
    ))
}

/// Run one parsed request against the service; returns the response envelope.
pub async fn dispatch(customers: &Customers, request: &SoapRequest) -> Result<String, SoapFault> {
    let op = request.operation.as_str();
    let returns = match op {
        "getAllCustomer" => customers.list().await?,
        "customerById" => vec![customers.get_by_id(request.id()?).await?],
        "customerByName" => customers.find_by_name_contains(request.name()?).await?,
        "saveCustomer" => vec![customers.create(request.customer()?).await?],
        "updateCustomer" => {
            let id = request.id()?;
            vec![customers.update(id, request.customer()?).await?]
        }
        "deleteCustomer" => {
            customers.delete(request.id()?).await?;
            Vec::new()
        }
        other => return Err(SoapFault::bad_request(format!("unknown operation: {other}"))),
    };
    Ok(render_response(op, &returns))
}

pub async fn soap_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match parse_body(&body) {
        Ok(request) => dispatch(&state.customers, &request).await,
        Err(fault) => Err(fault),
    };
    match result {
        Ok(xml) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], xml).into_response(),
        Err(fault) => {
            if fault.code == "soap:Client" {
                warn!(error_code = fault.error_code, message = %fault.message, "soap fault");
            }
            fault.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use models::validation::CustomerValidator;
    use service::customer::repository::mock::{
        InMemoryCustomerRepository, UnavailableCustomerRepository,
    };
    use service::customer::CustomerService;

    fn wrap(body: &str) -> String {
        format!(
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" \
             xmlns:ns=\"{SERVICE_NS}\"><soapenv:Header/><soapenv:Body>{body}</soapenv:Body>\
             </soapenv:Envelope>"
        )
    }

    fn customers() -> Customers {
        let repo = InMemoryCustomerRepository::with_customers([
            ("momo", "momo@gmail.com"),
            ("moha", "moha@gmail.com"),
        ]);
        let validator = Arc::new(CustomerValidator::new().unwrap());
        Arc::new(CustomerService::new(Arc::new(repo), validator))
    }

    async fn run(svc: &Customers, body: &str) -> Result<String, SoapFault> {
        dispatch(svc, &parse_request(&wrap(body)).unwrap()).await
    }

    #[test]
    fn parses_operation_and_nested_params() {
        let req = parse_request(&wrap(
            "<ns:updateCustomer><id> 3 </id>\
             <customer><name>Zakia</name><email/></customer></ns:updateCustomer>",
        ))
        .unwrap();
        assert_eq!(req.operation, "updateCustomer");
        assert_eq!(req.id().unwrap(), 3);
        let input = req.customer().unwrap();
        assert_eq!(input.name.as_deref(), Some("Zakia"));
        assert_eq!(input.email.as_deref(), Some(""));
    }

    #[test]
    fn parses_empty_operation_element() {
        let req = parse_request(&wrap("<ns:getAllCustomer/>")).unwrap();
        assert_eq!(req.operation, "getAllCustomer");
    }

    #[test]
    fn unescapes_text() {
        let req =
            parse_request(&wrap("<ns:customerByName><name>a&amp;b</name></ns:customerByName>"))
                .unwrap();
        assert_eq!(req.param("name"), Some("a&b"));
    }

    #[test]
    fn reads_cdata_as_text() {
        let req = parse_request(&wrap(
            "<ns:customerByName><name><![CDATA[momo]]></name></ns:customerByName>",
        ))
        .unwrap();
        assert_eq!(req.param("name"), Some("momo"));

        let req = parse_request(&wrap(
            "<ns:customerByName><name><![CDATA[a<b]]></name></ns:customerByName>",
        ))
        .unwrap();
        assert_eq!(req.param("name"), Some("a<b"));
    }

    #[test]
    fn rejects_envelope_without_body() {
        let fault = parse_request("<soap:Envelope xmlns:soap=\"x\"></soap:Envelope>").unwrap_err();
        assert_eq!(fault.error_code, "BAD_REQUEST");
        assert!(parse_request("<not-closed").is_err());
    }

    #[test]
    fn rejects_non_utf8_body() {
        let fault = parse_body(b"\xff\xfe<soap:Envelope/>").unwrap_err();
        assert_eq!((fault.code, fault.error_code), ("soap:Client", "BAD_REQUEST"));
        assert!(fault.render().contains("<faultcode>soap:Client</faultcode>"));

        let req = parse_body(wrap("<ns:getAllCustomer/>").as_bytes()).unwrap();
        assert_eq!(req.operation, "getAllCustomer");
    }

    #[tokio::test]
    async fn dispatch_lists_and_fetches() {
        let svc = customers();
        let xml = run(&svc, "<ns:getAllCustomer/>").await.unwrap();
        assert!(xml.contains("<ns:getAllCustomerResponse"));
        assert_eq!(xml.matches("<return>").count(), 2);

        let xml = run(&svc, "<ns:customerById><id>2</id></ns:customerById>").await.unwrap();
        assert!(xml.contains(
            "<return><id>2</id><name>moha</name><email>moha@gmail.com</email></return>"
        ));
    }

    #[tokio::test]
    async fn dispatch_maps_failures_to_faults() {
        let svc = customers();
        let fault = run(&svc, "<ns:customerById><id>9</id></ns:customerById>").await.unwrap_err();
        assert_eq!((fault.code, fault.error_code), ("soap:Client", "NOT_FOUND"));

        let save = "<ns:saveCustomer><customer><name>x</name><email>bad-email</email>\
                    </customer></ns:saveCustomer>";
        let fault = run(&svc, save).await.unwrap_err();
        assert_eq!(fault.error_code, "VALIDATION_FAILED");
        let rendered = fault.render();
        assert!(rendered.contains("<violation field=\"name\">"));
        assert!(rendered.contains("<violation field=\"email\">"));

        let fault = run(&svc, "<ns:customerById><id>abc</id></ns:customerById>").await.unwrap_err();
        assert_eq!(fault.error_code, "BAD_REQUEST");

        let fault = run(&svc, "<ns:dropTables/>").await.unwrap_err();
        assert_eq!(fault.error_code, "BAD_REQUEST");
    }

    #[tokio::test]
    async fn dispatch_maps_store_failure_to_server_fault() {
        let validator = Arc::new(CustomerValidator::new().unwrap());
        let svc: Customers =
            Arc::new(CustomerService::new(Arc::new(UnavailableCustomerRepository), validator));

        let fault = run(&svc, "<ns:getAllCustomer/>").await.unwrap_err();
        assert_eq!(fault.code, "soap:Server");
        assert_eq!(fault.error_code, "INTERNAL_ERROR");
        assert_eq!(fault.message, "An error has occurred.");
        let rendered = fault.render();
        assert!(rendered.contains("<faultcode>soap:Server</faultcode>"));
        assert!(rendered.contains("<faultstring>An error has occurred.</faultstring>"));
        assert!(!rendered.contains("connection refused"));
    }

    #[tokio::test]
    async fn delete_renders_empty_response() {
        let svc = customers();
        let xml = run(&svc, "<ns:deleteCustomer><id>1</id></ns:deleteCustomer>").await.unwrap();
        assert!(xml.contains("></ns:deleteCustomerResponse>"));
        assert!(!xml.contains("<return>"));
    }
}
