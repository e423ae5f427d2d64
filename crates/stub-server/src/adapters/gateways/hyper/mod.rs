mod server;

pub use server::Hyper;
