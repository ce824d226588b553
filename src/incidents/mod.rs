pub mod service;

pub use service::IncidentService;
