mod hyper;

pub use self::hyper::Hyper;
