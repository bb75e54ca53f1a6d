use crate::domain::model::{AvailabilityQuery, DaySlots, DepositRequest, OutgoingEmail, PaymentReceipt};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_deposit(&self, request: &DepositRequest) -> Result<PaymentReceipt>;
}

#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn availability(&self, query: &AvailabilityQuery) -> Result<Vec<DaySlots>>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the provider's message id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}
