//! End-to-end generation: parse, normalize, lower, resolve and emit.

use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::emit::{GeneratedCode, Target, emit_target, emitter_for};
use crate::error::Result;
use crate::ir::lower_document;
use crate::normalize::normalize_document;
use crate::resolve::{ResolvedApi, resolve};
use crate::spec::OpenApiDocument;

/// Run every target-independent stage. The result is immutable and can be
/// shared between emitters running in parallel.
pub fn prepare(mut doc: OpenApiDocument) -> Result<ResolvedApi> {
    let source = doc.source.take();
    let (normalized, summary) = normalize_document(doc);
    debug!(
        merged_compositions = summary.merged_compositions,
        extracted_enums = summary.extracted_enums.len(),
        stripped_tags = summary.stripped_tags,
        "Normalized document"
    );
    let ir = lower_document(&normalized)?;
    info!(
        models = ir.model_count(),
        operations = ir.operation_count(),
        "Lowered document"
    );
    Ok(resolve(ir).with_source(source))
}

/// [`prepare`] from JSON or YAML text.
pub fn prepare_from_str(text: &str) -> Result<ResolvedApi> {
    prepare(OpenApiDocument::parse(text)?)
}

/// Generate one target from a parsed document.
pub fn generate(
    doc: OpenApiDocument,
    target: Target,
    config: &GeneratorConfig,
) -> Result<GeneratedCode> {
    let api = prepare(doc)?;
    emit_target(&api, emitter_for(target, config).as_ref())
}

/// Generate one target from JSON or YAML text.
pub fn generate_from_str(
    text: &str,
    target: Target,
    config: &GeneratorConfig,
) -> Result<GeneratedCode> {
    generate(OpenApiDocument::parse(text)?, target, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_generate_from_yaml() {
        let yaml = r#"
openapi: 3.0.0
paths:
  /ping:
    get:
      operationId: ping
      responses:
        "204":
          description: pong
"#;
        for target in Target::ALL {
            let code = generate_from_str(yaml, target, &GeneratorConfig::default()).unwrap();
            assert_eq!(code.target, target);
            assert_eq!(code.operations.len(), 1);
            assert!(code.excluded.is_empty());
        }
    }

    #[test]
    fn test_generate_rejects_malformed_input() {
        let err = generate_from_str("{ not json", Target::Server, &GeneratorConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse { format: "JSON", .. }));
    }
}
