//! Customer use cases.

use crate::model::customer::Customer;
use crate::model::runtime::{IdGenerator, UuidIdGenerator};
use crate::repo::customer_repo::CustomerGateway;
use crate::service::error::{conflict_as_validation, settle, ServiceError, ServiceResult};
use crate::service::CreatedId;
use crate::validation::Notification;
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDetails {
    pub id: String,
    pub name: String,
    pub email: String,
}

pub struct CustomerService<C, I = UuidIdGenerator> {
    customers: C,
    ids: I,
}

impl<C: CustomerGateway> CustomerService<C> {
    pub fn new(customers: C) -> Self {
        Self::with_ids(customers, UuidIdGenerator)
    }
}

impl<C: CustomerGateway, I: IdGenerator> CustomerService<C, I> {
    pub fn with_ids(customers: C, ids: I) -> Self {
        Self { customers, ids }
    }

    /// Registers a customer. Emails are not required to be unique.
    pub fn create_customer(&self, input: &CustomerInput) -> ServiceResult<CreatedId> {
        let mut notification = Notification::new();
        let customer = notification.validate(|| {
            Customer::create(&self.ids, input.name.as_deref(), input.email.as_deref())
        });
        let customer = settle(customer, notification, "Invalid customer")?;

        let stored = self
            .customers
            .create(&customer)
            .map_err(conflict_as_validation("Invalid customer"))?;
        info!(
            "event=customer_create module=service status=ok customer_id={}",
            stored.id()
        );
        Ok(CreatedId::from(stored.id()))
    }

    pub fn get_customer(&self, id: &str) -> ServiceResult<CustomerDetails> {
        let customer = self
            .customers
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer with ID {id} was not found")))?;
        Ok(CustomerDetails {
            id: customer.id().to_string(),
            name: customer.name().to_string(),
            email: customer.email().to_string(),
        })
    }
}
