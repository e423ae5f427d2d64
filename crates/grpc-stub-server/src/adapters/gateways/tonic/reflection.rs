use std::collections::HashMap;
use std::convert::Infallible;
use tonic::body::Body;
use tower::util::BoxCloneSyncService;

use crate::entities::DescriptorRegistry;
use crate::error::LoadError;

pub(super) type ReflectionService =
    BoxCloneSyncService<http::Request<Body>, http::Response<Body>, Infallible>;

const V1: &str = "grpc.reflection.v1.ServerReflection";
const V1_ALPHA: &str = "grpc.reflection.v1alpha.ServerReflection";

/// Server reflection over one registry, keyed by reflection service name
pub(super) fn reflection_services(
    registry: &DescriptorRegistry,
) -> Result<HashMap<&'static str, ReflectionService>, LoadError> {
    let files = registry.file_descriptor_set();

    let v1 = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(files.clone())
        .build_v1()?;
    let v1_alpha = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(files)
        .build_v1alpha()?;

    Ok(HashMap::from([
        (V1, BoxCloneSyncService::new(v1)),
        (V1_ALPHA, BoxCloneSyncService::new(v1_alpha)),
    ]))
}
