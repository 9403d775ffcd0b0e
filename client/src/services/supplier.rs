//! Supplier directory service

use shared::{Supplier, SupplierInput, SupplierSnapshot};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::paths::SUPPLIERS;
use crate::confirm::{require_confirmation, ConfirmPrompt, Confirmer};
use crate::error::{AppError, AppResult};
use crate::gateway::ApiClient;

/// Supplier service for the supplier directory
#[derive(Clone)]
pub struct SupplierService {
    api: ApiClient,
}

impl SupplierService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> AppResult<Vec<Supplier>> {
        self.api.get(SUPPLIERS).await.json()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Supplier> {
        self.list()
            .await?
            .into_iter()
            .find(|supplier| supplier.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Supplier {}", id)))
    }

    pub async fn create(&self, input: &SupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        let supplier: Supplier = self.api.post(SUPPLIERS, input).await.json()?;
        info!(supplier_id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    /// Edits never reach quotations that already hold a snapshot
    pub async fn update(&self, id: Uuid, input: &SupplierInput) -> AppResult<Supplier> {
        input.validate()?;
        self.api
            .put(&format!("{}/{}", SUPPLIERS, id), input)
            .await
            .json()
    }

    pub async fn delete(&self, id: Uuid, confirmer: &dyn Confirmer) -> AppResult<()> {
        let supplier = self.get(id).await?;
        let prompt = ConfirmPrompt::new(
            "Delete supplier",
            format!("Delete supplier \"{}\"?", supplier.name),
        );
        require_confirmation(confirmer, &prompt)?;

        self.api
            .delete(&format!("{}/{}", SUPPLIERS, id))
            .await
            .into_result()?;
        info!(supplier_id = %id, "Supplier deleted");
        Ok(())
    }

    /// Value copy of the supplier's current terms
    pub async fn snapshot(&self, id: Uuid) -> AppResult<SupplierSnapshot> {
        let supplier = self.get(id).await?;
        Ok(SupplierSnapshot::from(&supplier))
    }
}
