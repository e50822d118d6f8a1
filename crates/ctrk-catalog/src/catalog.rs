//! # Catalog Loading
//!
//! The catalog is one YAML document with four top-level sections:
//!
//! ```yaml
//! compliance_types: [...]
//! applicability_rules: [...]
//! services: [...]
//! workflows:
//!   default: [...]
//!   schemas:
//!     MCA_ANNUAL_RETURN: [...]
//! ```
//!
//! Parsing is strict (`deny_unknown_fields` throughout), and the parsed
//! document is cross-checked before a [`Catalog`] is handed out, so every
//! consumer can rely on codes being unique and references resolving.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ctrk_core::{ComplianceTypeCode, ServiceCode};
use serde::Deserialize;

use crate::compliance_type::ComplianceType;
use crate::error::{CatalogError, CatalogResult};
use crate::rules::{ApplicabilityEngine, ApplicabilityRule};
use crate::service::Service;
use crate::workflow::{WorkflowRegistry, WorkflowSchema};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    compliance_types: Vec<ComplianceType>,
    #[serde(default)]
    applicability_rules: Vec<ApplicabilityRule>,
    #[serde(default)]
    services: Vec<Service>,
    workflows: WorkflowRegistry,
}

/// Validated, immutable compliance reference data.
#[derive(Debug, Clone)]
pub struct Catalog {
    compliance_types: Vec<ComplianceType>,
    type_index: HashMap<ComplianceTypeCode, usize>,
    engine: ApplicabilityEngine,
    services: Vec<Service>,
    workflows: WorkflowRegistry,
}

impl Catalog {
    /// The dataset embedded in this crate.
    pub fn builtin() -> CatalogResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG, "builtin")
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            compliance_types = catalog.compliance_types.len(),
            services = catalog.services.len(),
            "loaded compliance catalog"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from YAML text. `origin` names the
    /// source in error messages.
    pub fn from_yaml_str(yaml: &str, origin: &str) -> CatalogResult<Self> {
        let doc: CatalogDocument =
            serde_yaml::from_str(yaml).map_err(|source| CatalogError::YamlParse {
                origin: origin.to_string(),
                source,
            })?;
        Self::from_document(doc)
    }

    fn from_document(doc: CatalogDocument) -> CatalogResult<Self> {
        let mut type_index = HashMap::with_capacity(doc.compliance_types.len());
        for (i, ct) in doc.compliance_types.iter().enumerate() {
            if type_index.insert(ct.code.clone(), i).is_some() {
                return Err(CatalogError::DuplicateCode {
                    kind: "compliance type",
                    code: ct.code.to_string(),
                });
            }
            ct.deadline
                .validate()
                .map_err(|reason| CatalogError::InvalidDueDate {
                    code: ct.code.to_string(),
                    reason,
                })?;
        }

        let known = |code: &ComplianceTypeCode, context: String| -> CatalogResult<()> {
            if type_index.contains_key(code) {
                Ok(())
            } else {
                Err(CatalogError::UnknownComplianceType {
                    context,
                    code: code.to_string(),
                })
            }
        };

        let mut ruled = HashSet::new();
        for rule in &doc.applicability_rules {
            known(&rule.compliance_type, "applicability rule".to_string())?;
            if !ruled.insert(rule.compliance_type.clone()) {
                return Err(CatalogError::DuplicateCode {
                    kind: "applicability rule",
                    code: rule.compliance_type.to_string(),
                });
            }
            rule.due_date_calculation
                .validate()
                .map_err(|reason| CatalogError::InvalidDueDate {
                    code: rule.compliance_type.to_string(),
                    reason,
                })?;
        }

        let mut service_codes: HashSet<&ServiceCode> = HashSet::new();
        for service in &doc.services {
            if !service_codes.insert(&service.code) {
                return Err(CatalogError::DuplicateCode {
                    kind: "service",
                    code: service.code.to_string(),
                });
            }
            for code in &service.compliance_types {
                known(code, format!("service {}", service.code))?;
            }
        }

        if let Some(reason) = doc.workflows.default.problem() {
            return Err(CatalogError::InvalidWorkflow {
                code: "default".to_string(),
                reason,
            });
        }
        for (code, schema) in &doc.workflows.schemas {
            known(code, "workflow schema".to_string())?;
            if let Some(reason) = schema.problem() {
                return Err(CatalogError::InvalidWorkflow {
                    code: code.to_string(),
                    reason,
                });
            }
        }

        Ok(Self {
            compliance_types: doc.compliance_types,
            type_index,
            engine: ApplicabilityEngine::new(doc.applicability_rules),
            services: doc.services,
            workflows: doc.workflows,
        })
    }

    pub fn compliance_types(&self) -> &[ComplianceType] {
        &self.compliance_types
    }

    pub fn compliance_type(&self, code: &ComplianceTypeCode) -> Option<&ComplianceType> {
        self.type_index.get(code).map(|&i| &self.compliance_types[i])
    }

    /// The applicability engine over this catalog's rules.
    pub fn applicability(&self) -> &ApplicabilityEngine {
        &self.engine
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, code: &ServiceCode) -> Option<&Service> {
        self.services.iter().find(|s| &s.code == code)
    }

    pub fn workflows(&self) -> &WorkflowRegistry {
        &self.workflows
    }

    /// Shorthand for `workflows().schema_for(code)`.
    pub fn schema_for(&self, code: &ComplianceTypeCode) -> &WorkflowSchema {
        self.workflows.schema_for(code)
    }
}
