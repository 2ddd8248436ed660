pub mod calculator_routes;
