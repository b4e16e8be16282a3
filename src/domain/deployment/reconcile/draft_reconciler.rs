use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::deployment::error::DraftError;
use crate::domain::deployment::model::bento_schema::BentoManifestSchema;
use crate::domain::deployment::model::cluster_schema::ClusterSchema;
use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentSchema, DeploymentRevisionSchema, DeploymentSchema,
};
use crate::domain::deployment::model::draft::{
    baseline_hpa_conf, baseline_resources, DeploymentDraft, RunnerConfigDraft, TargetDraft,
};

use super::config_blob::{decode_target, dedupe_env_keys, encode_target};
use super::field_path::FieldPath;

/// Namespace used when the selected cluster has none configured.
pub const DEFAULT_KUBE_NAMESPACE: &str = "yatai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    New,
    Edit,
}

/// Where the current `kube_namespace` value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NamespaceSource {
    Unset,
    Derived { cluster: String },
    Loaded,
    Manual,
}

/// UI-side bookkeeping for one target: runner tabs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TargetEditorState {
    pub active_runner: Option<String>,
    pub declared_runners: Vec<String>,
}

/// Keep the active runner if it is still declared, otherwise fall back to
/// the first declared runner. An empty declaration list keeps the current
/// tab.
pub fn sync_active_runner(active: Option<&str>, declared: &[String]) -> Option<String> {
    match active {
        Some(name) if declared.iter().any(|d| d == name) => Some(name.to_string()),
        _ if !declared.is_empty() => declared.first().cloned(),
        _ => active.map(str::to_string),
    }
}

/// Default per-runner configuration derived from a bento manifest.
///
/// Every runner gets its own copy of the baseline blocks; a CPU hint in the
/// manifest overrides both the request and the limit.
pub fn seed_runners(manifest: &BentoManifestSchema) -> BTreeMap<String, RunnerConfigDraft> {
    manifest
        .runners
        .iter()
        .map(|runner| {
            let mut resources = baseline_resources();
            if let Some(cpu) = runner
                .resource_config
                .as_ref()
                .and_then(|c| c.cpu_quantity())
            {
                let requests = resources.requests.get_or_insert_with(Default::default);
                requests.cpu = cpu.clone();
                let limits = resources.limits.get_or_insert_with(Default::default);
                limits.cpu = cpu;
            }
            let config = RunnerConfigDraft {
                hpa_conf: Some(baseline_hpa_conf()),
                resources: Some(resources),
                ..RunnerConfigDraft::default()
            };
            (runner.name.clone(), config)
        })
        .collect()
}

/// Owns one deployment draft and applies updates to it.
///
/// Every operation either applies completely or returns an error and leaves
/// the draft as it was.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftReconciler {
    draft: DeploymentDraft,
    last_revision_uid: Option<String>,
    namespace_source: NamespaceSource,
    editors: Vec<TargetEditorState>,
}

impl DraftReconciler {
    /// Fresh draft for a new deployment with a single baseline target.
    pub fn initialize(cluster_name: Option<String>) -> Self {
        Self {
            draft: DeploymentDraft {
                cluster_name,
                name: String::new(),
                description: Some(String::new()),
                kube_namespace: None,
                targets: vec![TargetDraft::baseline()],
            },
            last_revision_uid: None,
            namespace_source: NamespaceSource::Unset,
            editors: vec![TargetEditorState::default()],
        }
    }

    pub fn draft(&self) -> &DeploymentDraft {
        &self.draft
    }

    pub fn mode(&self) -> DraftMode {
        if self.last_revision_uid.is_some() {
            DraftMode::Edit
        } else {
            DraftMode::New
        }
    }

    pub fn last_revision_uid(&self) -> Option<&str> {
        self.last_revision_uid.as_deref()
    }

    pub fn namespace_source(&self) -> &NamespaceSource {
        &self.namespace_source
    }

    pub fn editors(&self) -> &[TargetEditorState] {
        &self.editors
    }

    pub fn editor(&self, target_index: usize) -> Option<&TargetEditorState> {
        self.editors.get(target_index)
    }

    /// Project an existing deployment and its revision into the draft.
    ///
    /// Returns `false` without touching anything when this revision was
    /// already loaded, so in-progress edits survive repeated calls.
    pub fn load_from_revision(
        &mut self,
        cluster_name: Option<&str>,
        deployment: &DeploymentSchema,
        revision: &DeploymentRevisionSchema,
    ) -> bool {
        if self.last_revision_uid.as_deref() == Some(revision.uid.as_str()) {
            debug!(revision = %revision.uid, "revision already loaded, keeping draft");
            return false;
        }

        let mut targets: Vec<TargetDraft> = revision.targets.iter().map(decode_target).collect();
        if targets.is_empty() {
            targets.push(TargetDraft::baseline());
        }

        let editors = targets
            .iter()
            .enumerate()
            .map(|(idx, target)| {
                let declared = revision
                    .targets
                    .get(idx)
                    .and_then(|t| t.bento.manifest.as_ref())
                    .map(BentoManifestSchema::runner_names)
                    .unwrap_or_else(|| target.config.runners.keys().cloned().collect());
                let previous = self.editors.get(idx).and_then(|e| e.active_runner.as_deref());
                TargetEditorState {
                    active_runner: sync_active_runner(previous, &declared),
                    declared_runners: declared,
                }
            })
            .collect();

        self.draft = DeploymentDraft {
            cluster_name: cluster_name
                .map(str::to_string)
                .or_else(|| deployment.cluster.as_ref().map(|c| c.name.clone())),
            name: deployment.name.clone(),
            description: deployment.description.clone(),
            kube_namespace: deployment.kube_namespace.clone(),
            targets,
        };
        self.editors = editors;
        self.namespace_source = NamespaceSource::Loaded;
        self.last_revision_uid = Some(revision.uid.clone());

        debug!(
            deployment = %deployment.name,
            revision = %revision.uid,
            targets = self.draft.targets.len(),
            "loaded revision into draft"
        );
        true
    }

    /// Select the cluster a new deployment goes to.
    ///
    /// A namespace derived from the previous cluster is cleared so the next
    /// cluster-info arrival can derive a fresh one; a manual one is kept.
    pub fn select_cluster(&mut self, cluster_name: &str) -> Result<(), DraftError> {
        if self.mode() == DraftMode::Edit {
            return Err(DraftError::ImmutableField("cluster_name"));
        }
        if self.draft.cluster_name.as_deref() == Some(cluster_name) {
            return Ok(());
        }

        self.draft.cluster_name = Some(cluster_name.to_string());
        if let NamespaceSource::Derived { .. } = self.namespace_source {
            self.draft.kube_namespace = None;
            self.namespace_source = NamespaceSource::Unset;
        }
        Ok(())
    }

    /// Merge freshly fetched cluster info into the current draft.
    ///
    /// Applies the derived namespace once per selected cluster, and never
    /// over a namespace typed by the operator or loaded from a deployment.
    /// Returns whether the namespace changed.
    pub fn apply_cluster_info(&mut self, cluster: &ClusterSchema) -> bool {
        if self.draft.cluster_name.as_deref() != Some(cluster.name.as_str()) {
            debug!(cluster = %cluster.name, "ignoring info for a cluster that is no longer selected");
            return false;
        }

        match &self.namespace_source {
            NamespaceSource::Manual | NamespaceSource::Loaded => false,
            NamespaceSource::Derived { cluster: derived_from } if *derived_from == cluster.name => {
                false
            }
            _ => {
                let namespace = cluster
                    .default_deployment_kube_namespace()
                    .unwrap_or(DEFAULT_KUBE_NAMESPACE)
                    .to_string();
                debug!(cluster = %cluster.name, namespace = %namespace, "derived kube namespace");
                self.draft.kube_namespace = Some(namespace);
                self.namespace_source = NamespaceSource::Derived {
                    cluster: cluster.name.clone(),
                };
                true
            }
        }
    }

    /// Select the bento a target deploys.
    ///
    /// With a manifest, runner tabs follow the declared runners. Runner
    /// configuration is reseeded from the manifest only for new deployments;
    /// a loaded revision keeps its own.
    pub fn select_bento(
        &mut self,
        target_index: usize,
        repository: &str,
        version: &str,
        manifest: Option<&BentoManifestSchema>,
    ) -> Result<(), DraftError> {
        let mode = self.mode();
        self.check_target(target_index)?;
        let target = &mut self.draft.targets[target_index];

        target.bento_repository = repository.to_string();
        target.bento = version.to_string();

        let Some(manifest) = manifest else {
            return Ok(());
        };

        let declared = manifest.runner_names();
        let editor = &mut self.editors[target_index];
        editor.active_runner = sync_active_runner(editor.active_runner.as_deref(), &declared);
        editor.declared_runners = declared;

        if mode == DraftMode::New {
            target.config.runners = seed_runners(manifest);
            debug!(
                target = target_index,
                runners = target.config.runners.len(),
                "seeded runner configuration from manifest"
            );
        }
        Ok(())
    }

    /// Apply a manifest fetched for `repository:version`, unless the target
    /// has moved on to another bento in the meantime. Returns whether it was
    /// applied.
    pub fn apply_manifest(
        &mut self,
        target_index: usize,
        repository: &str,
        version: &str,
        manifest: &BentoManifestSchema,
    ) -> Result<bool, DraftError> {
        self.check_target(target_index)?;
        let target = &self.draft.targets[target_index];
        if target.bento_repository != repository || target.bento != version {
            debug!(
                target = target_index,
                bento = %format!("{}:{}", repository, version),
                "ignoring manifest for a bento that is no longer selected"
            );
            return Ok(false);
        }
        self.select_bento(target_index, repository, version, Some(manifest))?;
        Ok(true)
    }

    /// Switch the active runner tab, creating an empty runner configuration
    /// when the runner has none yet.
    pub fn set_active_runner(&mut self, target_index: usize, runner: &str) -> Result<(), DraftError> {
        self.check_target(target_index)?;
        self.draft.targets[target_index]
            .config
            .runners
            .entry(runner.to_string())
            .or_default();
        self.editors[target_index].active_runner = Some(runner.to_string());
        Ok(())
    }

    /// Edit the free-text BentoML configuration of a target, or of one of its
    /// runners. For a runner, `None` returns it to sharing the target's blob.
    pub fn set_config_blob(
        &mut self,
        target_index: usize,
        runner: Option<&str>,
        value: Option<String>,
    ) -> Result<(), DraftError> {
        self.check_target(target_index)?;
        let config = &mut self.draft.targets[target_index].config;
        match runner {
            None => config.bentoml_config = value.unwrap_or_default(),
            Some(name) => {
                config.runners.entry(name.to_string()).or_default().bentoml_config = value;
            }
        }
        Ok(())
    }

    /// Overwrite the field addressed by `path`; everything else is left as
    /// is. Env lists are deduplicated afterwards.
    pub fn apply_field_edit(&mut self, path: &FieldPath, value: Value) -> Result<(), DraftError> {
        let mode = self.mode();
        match path.root_key() {
            Some(field @ ("name" | "cluster_name" | "kube_namespace" | "description"))
                if mode == DraftMode::Edit =>
            {
                return Err(DraftError::ImmutableField(immutable_name(field)));
            }
            Some("cluster_name") => return self.edit_cluster_name(path, value),
            _ => {}
        }
        if let Some(index) = path.target_index() {
            self.check_target(index)?;
        }

        let clears = value.is_null();
        let mut doc = serde_json::to_value(&self.draft).map_err(|e| invalid_value(path, e))?;
        path.set(&mut doc, value)?;
        let mut next: DeploymentDraft =
            serde_json::from_value(doc).map_err(|e| invalid_value(path, e))?;

        // Unknown members are dropped on the way back, so the edit must still
        // be addressable in the result. Cleared optionals may vanish entirely.
        let written = serde_json::to_value(&next).map_err(|e| invalid_value(path, e))?;
        let kept = path.get(&written).is_some()
            || (clears && path.parent(&written).is_some_and(Value::is_object));
        if !kept {
            return Err(DraftError::InvalidPath(path.to_string()));
        }

        if next.targets.is_empty() {
            return Err(DraftError::EmptyTargets);
        }
        for target in next.targets.iter_mut() {
            target.env_lists_mut().for_each(dedupe_env_keys);
        }

        self.draft = next;
        self.editors
            .resize_with(self.draft.targets.len(), TargetEditorState::default);
        if path.root_key() == Some("kube_namespace") {
            self.namespace_source = NamespaceSource::Manual;
        }
        Ok(())
    }

    /// Assemble the request body: env keys deduplicated and the BentoML
    /// configuration written under its reserved env key in every target and
    /// runner. The draft itself is not modified.
    pub fn prepare_for_submission(&self) -> CreateDeploymentSchema {
        CreateDeploymentSchema {
            cluster_name: self.draft.cluster_name.clone(),
            name: self.draft.name.clone(),
            description: self.draft.description.clone(),
            kube_namespace: self.draft.kube_namespace.clone(),
            targets: self.draft.targets.iter().map(encode_target).collect(),
        }
    }

    fn edit_cluster_name(&mut self, path: &FieldPath, value: Value) -> Result<(), DraftError> {
        if path.segments().len() != 1 {
            return Err(DraftError::InvalidPath(path.to_string()));
        }
        match serde_json::from_value::<Option<String>>(value).map_err(|e| invalid_value(path, e))? {
            Some(name) => self.select_cluster(&name),
            None => {
                self.draft.cluster_name = None;
                if let NamespaceSource::Derived { .. } = self.namespace_source {
                    self.draft.kube_namespace = None;
                    self.namespace_source = NamespaceSource::Unset;
                }
                Ok(())
            }
        }
    }

    fn check_target(&self, index: usize) -> Result<(), DraftError> {
        let len = self.draft.targets.len();
        if index >= len {
            return Err(DraftError::TargetOutOfRange { index, len });
        }
        Ok(())
    }
}

fn immutable_name(field: &str) -> &'static str {
    match field {
        "name" => "name",
        "cluster_name" => "cluster_name",
        "kube_namespace" => "kube_namespace",
        _ => "description",
    }
}

fn invalid_value(path: &FieldPath, err: serde_json::Error) -> DraftError {
    DraftError::InvalidValue {
        path: path.to_string(),
        reason: err.to_string(),
    }
}
