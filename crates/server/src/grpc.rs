use std::net::SocketAddr;
use std::future::Future;

use service::customer::{Customer, CustomerInput};
use service::errors::{ErrorKind, ServiceError};
use tonic::{transport::Server, Request, Response, Status};
use tracing::{error, info};

use crate::errors::StartupError;
use crate::state::Customers;

pub mod pb {
    tonic::include_proto!("customer.v1");
}

use pb::customer_service_server::{CustomerService, CustomerServiceServer};

/// gRPC front end for the customer operations.
pub struct CustomerGrpc {
    customers: Customers,
}

impl CustomerGrpc {
    pub fn new(customers: Customers) -> Self { Self { customers } }

    pub fn into_server(self) -> CustomerServiceServer<Self> { CustomerServiceServer::new(self) }
}

fn to_status(e: ServiceError) -> Status {
    match e.kind() {
        ErrorKind::NotFound => Status::not_found(e.public_message()),
        ErrorKind::ValidationFailed => {
            let message = e.violations().map(ToString::to_string).unwrap_or_default();
            Status::invalid_argument(message)
        }
        ErrorKind::Internal => {
            error!(error = %e, "grpc request failed");
            Status::internal(e.public_message())
        }
    }
}

impl From<Customer> for pb::CustomerResponse {
    fn from(c: Customer) -> Self {
        Self { id: c.id, name: c.name, email: c.email }
    }
}

impl From<pb::CustomerRequest> for CustomerInput {
    fn from(r: pb::CustomerRequest) -> Self {
        Self { name: r.name, email: r.email }
    }
}

fn to_list(customers: Vec<Customer>) -> pb::CustomerList {
    pb::CustomerList { customers: customers.into_iter().map(Into::into).collect() }
}

#[tonic::async_trait]
impl CustomerService for CustomerGrpc {
    async fn get_all_customers(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::CustomerList>, Status> {
        let list = self.customers.list().await.map_err(to_status)?;
        Ok(Response::new(to_list(list)))
    }

    async fn get_customer_by_id(
        &self,
        request: Request<pb::CustomerId>,
    ) -> Result<Response<pb::CustomerResponse>, Status> {
        let id = request.into_inner().id;
        let customer = self.customers.get_by_id(id).await.map_err(to_status)?;
        Ok(Response::new(customer.into()))
    }

    async fn search_customers(
        &self,
        request: Request<pb::NameFragment>,
    ) -> Result<Response<pb::CustomerList>, Status> {
        let fragment = request.into_inner().name;
        let list = self.customers.find_by_name_contains(&fragment).await.map_err(to_status)?;
        Ok(Response::new(to_list(list)))
    }

    async fn create_customer(
        &self,
        request: Request<pb::CustomerRequest>,
    ) -> Result<Response<pb::CustomerResponse>, Status> {
        let created = self.customers.create(request.into_inner().into()).await.map_err(to_status)?;
        Ok(Response::new(created.into()))
    }

    async fn update_customer(
        &self,
        request: Request<pb::UpdateCustomerRequest>,
    ) -> Result<Response<pb::CustomerResponse>, Status> {
        let req = request.into_inner();
        let input = req.customer.map(CustomerInput::from).unwrap_or_default();
        let updated = self.customers.update(req.id, input).await.map_err(to_status)?;
        Ok(Response::new(updated.into()))
    }

    async fn delete_customer(
        &self,
        request: Request<pb::CustomerId>,
    ) -> Result<Response<pb::Empty>, Status> {
        self.customers.delete(request.into_inner().id).await.map_err(to_status)?;
        Ok(Response::new(pb::Empty {}))
    }
}

/// Serve the gRPC endpoint until `shutdown` resolves.
pub async fn serve_grpc<F>(
    addr: SocketAddr,
    customers: Customers,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send,
{
    info!(%addr, "starting grpc server");
    Server::builder()
        .add_service(CustomerGrpc::new(customers).into_server())
        .serve_with_shutdown(addr, shutdown)
        .await?;
    Ok(())
}
