pub mod tracing_axum;
