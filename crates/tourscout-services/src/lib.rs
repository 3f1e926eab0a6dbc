//! tourscout-services — the search orchestrator and its collaborators.

pub mod aggregator;
pub mod details;
pub mod gateway;
pub mod orchestrator;
pub mod scheduler;
pub mod state;

pub use aggregator::ResultAggregator;
pub use details::{load_tour_details, DetailsStatus, TourDetails};
pub use gateway::{GatewayError, SearchGateway, StartedSearch};
pub use orchestrator::SearchOrchestrator;
pub use scheduler::PollScheduler;
pub use state::{SearchTicket, SessionStore};
