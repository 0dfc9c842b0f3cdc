use async_trait::async_trait;

use super::{RegistryError, ServiceEntry, ServiceRegistry};

/// In-memory registry returning a fixed list of services
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    services: Vec<ServiceEntry>,
}

impl StaticRegistry {
    pub fn new(services: Vec<ServiceEntry>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }
}

impl From<Vec<ServiceEntry>> for StaticRegistry {
    fn from(services: Vec<ServiceEntry>) -> Self {
        Self::new(services)
    }
}

#[async_trait]
impl ServiceRegistry for StaticRegistry {
    async fn list_all(&self) -> Result<Vec<ServiceEntry>, RegistryError> {
        Ok(self.services.clone())
    }
}
