pub mod relay_routes;
