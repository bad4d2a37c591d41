use std::path::Path;

use async_trait::async_trait;

use crate::errors::ParseError;
use crate::model::Plan;
use crate::resolver::Resolve;

/// A deployment document parser that delegates import lookups to a resolver.
///
/// Implementations call `resolver.resolve` for each import they cannot handle
/// themselves, in document order, and abort on the first resolver failure,
/// surfacing it unchanged as [`ParseError::Resolve`].
#[async_trait]
pub trait DslParser: Send + Sync {
    async fn parse(
        &self,
        dsl_location: &Path,
        resources_base_path: &Path,
        resolver: &dyn Resolve,
    ) -> Result<Plan, ParseError>;
}
