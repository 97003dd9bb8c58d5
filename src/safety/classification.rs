//! Static classification of tool names into write and destructive sets.
//!
//! # Invariants
//! - `destructive ⊆ write`, checked on construction
//! - Built once, never mutated afterwards

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use crate::safety::mode::SafetyMode;

/// Tools that mutate cluster state without removing resources.
const NON_DESTRUCTIVE_WRITES: &[&str] = &[
    "run_pod",
    "create_pod",
    "create_deployment",
    "create_namespace",
    "create_configmap",
    "create_secret",
    "create_service",
    "create_resource",
    "apply_manifest",
    "patch_resource",
    "label_resource",
    "annotate_resource",
    "scale_deployment",
    "scale_statefulset",
    "autoscale_deployment",
    "restart_deployment",
    "rollback_deployment",
    "set_image",
    "expose_service",
    "cordon_node",
    "uncordon_node",
    "taint_node",
    "install_helm_chart",
    "upgrade_helm_chart",
    "rollback_helm_release",
    "helm_repo_add",
    "port_forward",
    "kubectl_apply",
    "kubectl_create",
    "kubectl_patch",
    "kubectl_scale",
    "kubectl_rollout",
    "argocd_sync",
    "flux_reconcile",
];

/// Tools that delete or irreversibly remove resources.
const DESTRUCTIVE: &[&str] = &[
    "delete_pod",
    "delete_deployment",
    "delete_namespace",
    "delete_service",
    "delete_configmap",
    "delete_secret",
    "delete_pvc",
    "delete_resource",
    "drain_node",
    "cleanup_pods",
    "uninstall_helm_chart",
    "helm_repo_remove",
    "kubectl_delete",
    "istio_delete_virtualservice",
];

/// Returned when a custom table violates `destructive ⊆ write`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("destructive operations missing from the write set: {missing:?}")]
pub struct ClassificationError {
    pub missing: Vec<String>,
}

/// The two operation sets consulted by the gate.
#[derive(Debug, Clone)]
pub struct OperationClassification {
    write: BTreeSet<String>,
    destructive: BTreeSet<String>,
}

impl OperationClassification {
    /// Build a classification, rejecting destructive names absent from `write`.
    pub fn new<W, D>(write: W, destructive: D) -> Result<Self, ClassificationError>
    where
        W: IntoIterator,
        W::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let write: BTreeSet<String> = write.into_iter().map(Into::into).collect();
        let destructive: BTreeSet<String> = destructive.into_iter().map(Into::into).collect();

        let missing: Vec<String> = destructive.difference(&write).cloned().collect();
        if !missing.is_empty() {
            return Err(ClassificationError { missing });
        }

        Ok(Self { write, destructive })
    }

    /// The built-in Kubernetes tool table, shared process-wide.
    pub fn builtin() -> &'static OperationClassification {
        Self::builtin_table()
    }

    /// Shared handle to the built-in table; every caller gets the same allocation.
    pub fn builtin_shared() -> Arc<OperationClassification> {
        Arc::clone(Self::builtin_table())
    }

    fn builtin_table() -> &'static Arc<OperationClassification> {
        static BUILTIN: OnceLock<Arc<OperationClassification>> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let destructive: BTreeSet<String> = DESTRUCTIVE.iter().map(|s| s.to_string()).collect();
            let write = NON_DESTRUCTIVE_WRITES
                .iter()
                .map(|s| s.to_string())
                .chain(destructive.iter().cloned())
                .collect();
            Arc::new(Self { write, destructive })
        })
    }

    pub fn is_write(&self, operation: &str) -> bool {
        self.write.contains(operation)
    }

    pub fn is_destructive(&self, operation: &str) -> bool {
        self.destructive.contains(operation)
    }

    /// All writes, destructive ones included.
    pub fn write_operations(&self) -> &BTreeSet<String> {
        &self.write
    }

    pub fn destructive_operations(&self) -> &BTreeSet<String> {
        &self.destructive
    }

    /// The rule shared by enforcement and reporting.
    pub fn is_blocked(&self, mode: SafetyMode, operation: &str) -> bool {
        match mode {
            SafetyMode::Normal => false,
            SafetyMode::ReadOnly => self.is_write(operation) || self.is_destructive(operation),
            SafetyMode::DisableDestructive => self.is_destructive(operation),
        }
    }

    /// Every classified name that `mode` rejects.
    pub fn blocked_under(&self, mode: SafetyMode) -> BTreeSet<String> {
        self.write
            .union(&self.destructive)
            .filter(|op| self.is_blocked(mode, op))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_destructive_is_subset_of_write() {
        let table = OperationClassification::builtin();
        assert!(table.destructive_operations().is_subset(table.write_operations()));
        assert!(table.is_destructive("delete_pod"));
        assert!(table.is_write("delete_pod"));
        assert!(table.is_write("scale_deployment"));
        assert!(!table.is_destructive("scale_deployment"));
    }

    #[test]
    fn test_new_rejects_destructive_outside_write() {
        let err = OperationClassification::new(["scale"], ["scale", "nuke"]).unwrap_err();
        assert_eq!(err.missing, vec!["nuke".to_string()]);
    }

    #[test]
    fn test_blocked_under_each_mode() {
        let table = OperationClassification::new(["scale", "delete"], ["delete"]).unwrap();
        assert!(table.blocked_under(SafetyMode::Normal).is_empty());
        assert_eq!(
            table.blocked_under(SafetyMode::ReadOnly),
            BTreeSet::from(["delete".to_string(), "scale".to_string()])
        );
        assert_eq!(
            table.blocked_under(SafetyMode::DisableDestructive),
            BTreeSet::from(["delete".to_string()])
        );
    }
}
