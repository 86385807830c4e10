pub mod audit;
pub mod games;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod players;
pub mod routes;

pub use routes::create_router;
