pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    crate::{
        adapters::{pelecard::PelecardClient, sumit::SumitClient},
        config::AppConfig,
        infra::scratch_store::ScratchStore,
    },
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: PelecardClient,
    pub accounting: SumitClient,
    pub store: ScratchStore,
}
