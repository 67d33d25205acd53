// Interface adapters: outbound sheet clients and the HTTP surface.

pub mod clients;
pub mod handlers;
pub mod navigation;
pub mod protocol;
pub mod routes;
pub mod state;
