use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::client::yatai_api_trait::YataiApi;
use crate::core::state::runtime::draft::draft_session::DraftSession;
use crate::core::state::runtime::draft::draft_session_repository_trait::DraftSessionRepositoryTrait;
use crate::domain::deployment::dto::draft_request::{
    ActiveRunnerRequest, ConfigBlobRequest, CreateDraftRequest, OpenDeploymentDraftRequest,
    SelectBentoRequest, SelectClusterRequest,
};
use crate::domain::deployment::dto::draft_view::DraftView;
use crate::domain::deployment::dto::field_edit_request::FieldEditRequest;
use crate::domain::deployment::error::DraftError;
use crate::domain::deployment::model::bento_schema::BentoManifestSchema;
use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentSchema, DeploymentRevisionSchema, DeploymentSchema, UpdateDeploymentSchema,
};
use crate::domain::deployment::reconcile::draft_reconciler::{DraftMode, DraftReconciler};

/// Server side of the deployment form.
///
/// Collaborator calls are awaited outside the repository lock; their results
/// are merged into whatever snapshot is current when they complete.
pub struct DeploymentDraftService<A: YataiApi, R: DraftSessionRepositoryTrait> {
    api: Arc<A>,
    repo: Arc<R>,
}

impl<A: YataiApi, R: DraftSessionRepositoryTrait> DeploymentDraftService<A, R> {
    pub fn new(api: Arc<A>, repo: Arc<R>) -> Self {
        Self { api, repo }
    }

    pub async fn create_draft(&self, req: CreateDraftRequest) -> Result<DraftView> {
        req.validate()?;

        let session = self
            .repo
            .insert(DraftSession::new(DraftReconciler::initialize(
                req.cluster_name.clone(),
            )))
            .await;
        info!(draft = %session.id, "opened draft for a new deployment");

        match req.cluster_name {
            Some(cluster) => {
                let session = self.refresh_cluster_info(session.id, &cluster).await?;
                Ok(DraftView::from(session.as_ref()))
            }
            None => Ok(DraftView::from(session.as_ref())),
        }
    }

    pub async fn open_deployment_draft(&self, req: OpenDeploymentDraftRequest) -> Result<DraftView> {
        req.validate()?;

        let (deployment, revision) = self
            .fetch_latest_revision(&req.cluster_name, &req.deployment_name)
            .await?;

        let mut reconciler = DraftReconciler::initialize(None);
        reconciler.load_from_revision(Some(&req.cluster_name), &deployment, &revision);
        for (index, repository, version, manifest) in self.fetch_manifests(&reconciler).await {
            reconciler.select_bento(index, &repository, &version, Some(&manifest))?;
        }

        let session = self.repo.insert(DraftSession::new(reconciler)).await;
        info!(
            draft = %session.id,
            deployment = %deployment.name,
            revision = %revision.uid,
            "opened draft for an existing deployment"
        );
        Ok(DraftView::from(session.as_ref()))
    }

    /// Load the deployment's latest revision again. A revision that is
    /// already loaded leaves the draft untouched.
    pub async fn reload_revision(&self, id: Uuid) -> Result<DraftView> {
        let session = self.session(id).await?;
        let draft = session.reconciler.draft();
        let cluster = draft.cluster_name.clone().unwrap_or_default();
        if session.reconciler.mode() != DraftMode::Edit || cluster.is_empty() {
            return Err(DraftError::NotLinked.into());
        }

        let (deployment, revision) = self.fetch_latest_revision(&cluster, &draft.name).await?;
        let (session, changed) = self
            .repo
            .update(id, |s| {
                Ok(s.reconciler
                    .load_from_revision(Some(&cluster), &deployment, &revision))
            })
            .await?;
        if !changed {
            return Ok(DraftView::from(session.as_ref()));
        }

        let manifests = self.fetch_manifests(&session.reconciler).await;
        let (session, _) = self
            .repo
            .update(id, |s| {
                for (index, repository, version, manifest) in &manifests {
                    s.reconciler
                        .apply_manifest(*index, repository, version, manifest)?;
                }
                Ok(())
            })
            .await?;
        Ok(DraftView::from(session.as_ref()))
    }

    pub async fn select_cluster(&self, id: Uuid, req: SelectClusterRequest) -> Result<DraftView> {
        req.validate()?;

        let cluster = req.cluster_name;
        self.repo
            .update(id, |s| Ok(s.reconciler.select_cluster(&cluster)?))
            .await?;
        let session = self.refresh_cluster_info(id, &cluster).await?;
        Ok(DraftView::from(session.as_ref()))
    }

    /// Point a target at a bento.
    ///
    /// The selection is recorded before the manifest is fetched. The manifest
    /// is applied only if the target still points at the same bento when it
    /// arrives. A failed fetch leaves runner configuration as is.
    pub async fn select_bento(
        &self,
        id: Uuid,
        target_index: usize,
        req: SelectBentoRequest,
    ) -> Result<DraftView> {
        req.validate()?;

        let SelectBentoRequest { repository, version } = req;
        let (session, _) = self
            .repo
            .update(id, |s| {
                Ok(s.reconciler
                    .select_bento(target_index, &repository, &version, None)?)
            })
            .await?;

        let manifest = match self.api.fetch_bento(&repository, &version).await {
            Ok(bento) => bento.manifest,
            Err(e) => {
                warn!(
                    draft = %id,
                    bento = %format!("{}:{}", repository, version),
                    error = %e,
                    "failed to fetch bento, keeping runner configuration"
                );
                None
            }
        };
        let Some(manifest) = manifest else {
            return Ok(DraftView::from(session.as_ref()));
        };

        let (session, _) = self
            .repo
            .update(id, |s| {
                Ok(s.reconciler
                    .apply_manifest(target_index, &repository, &version, &manifest)?)
            })
            .await?;
        Ok(DraftView::from(session.as_ref()))
    }

    pub async fn edit_field(&self, id: Uuid, req: FieldEditRequest) -> Result<DraftView> {
        let FieldEditRequest { path, value } = req;
        let (session, _) = self
            .repo
            .update(id, |s| Ok(s.reconciler.apply_field_edit(&path, value)?))
            .await?;
        debug!(draft = %id, path = %path, "applied field edit");
        Ok(DraftView::from(session.as_ref()))
    }

    pub async fn set_active_runner(
        &self,
        id: Uuid,
        target_index: usize,
        req: ActiveRunnerRequest,
    ) -> Result<DraftView> {
        req.validate()?;

        let (session, _) = self
            .repo
            .update(id, |s| {
                Ok(s.reconciler.set_active_runner(target_index, &req.runner)?)
            })
            .await?;
        Ok(DraftView::from(session.as_ref()))
    }

    pub async fn set_config_blob(
        &self,
        id: Uuid,
        target_index: usize,
        req: ConfigBlobRequest,
    ) -> Result<DraftView> {
        req.validate()?;

        let ConfigBlobRequest { runner, value } = req;
        let (session, _) = self
            .repo
            .update(id, |s| {
                Ok(s.reconciler
                    .set_config_blob(target_index, runner.as_deref(), value)?)
            })
            .await?;
        Ok(DraftView::from(session.as_ref()))
    }

    pub async fn get_draft(&self, id: Uuid) -> Result<DraftView> {
        let session = self.session(id).await?;
        Ok(DraftView::from(session.as_ref()))
    }

    /// Request body as it would be sent right now.
    pub async fn preview_payload(&self, id: Uuid) -> Result<CreateDeploymentSchema> {
        let session = self.session(id).await?;
        Ok(session.reconciler.prepare_for_submission())
    }

    pub async fn discard(&self, id: Uuid) -> Result<Value> {
        self.repo
            .remove(id)
            .await
            .ok_or(DraftError::SessionNotFound(id))?;
        info!(draft = %id, "discarded draft");

        Ok(json!({
            "message": "Draft discarded",
            "id": id,
        }))
    }

    /// Send the draft to Yatai: create for a new deployment, patch for an
    /// existing one.
    ///
    /// Only one submission per draft may be outstanding. On success the
    /// draft is closed; on failure it stays open with its edits intact.
    pub async fn submit(&self, id: Uuid) -> Result<DeploymentSchema> {
        let (session, (cluster, payload)) = self
            .repo
            .update(id, |s| {
                if s.submitting {
                    return Err(DraftError::SubmissionInFlight.into());
                }
                let payload = s.reconciler.prepare_for_submission();
                let cluster = payload
                    .cluster_name
                    .clone()
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| DraftError::InvalidValue {
                        path: "cluster_name".into(),
                        reason: "no cluster selected".into(),
                    })?;
                s.submitting = true;
                Ok((cluster, payload))
            })
            .await?;

        let result = match session.reconciler.mode() {
            DraftMode::New => self.api.create_deployment(&cluster, &payload).await,
            DraftMode::Edit => {
                let name = payload.name.clone();
                self.api
                    .update_deployment(&cluster, &name, &UpdateDeploymentSchema::from(payload))
                    .await
            }
        };

        match result {
            Ok(deployment) => {
                self.repo.remove(id).await;
                info!(draft = %id, deployment = %deployment.name, "submitted deployment");
                Ok(deployment)
            }
            Err(e) => {
                warn!(draft = %id, error = %e, "submission rejected, keeping draft");
                if let Err(release) = self
                    .repo
                    .update(id, |s| {
                        s.submitting = false;
                        Ok(())
                    })
                    .await
                {
                    warn!(draft = %id, error = %release, "could not release submission flag");
                }
                Err(e)
            }
        }
    }

    /// Drop drafts idle for longer than `ttl`.
    pub async fn prune_idle(&self, ttl: chrono::Duration) -> usize {
        self.repo.prune_idle(ttl).await
    }

    async fn session(&self, id: Uuid) -> Result<Arc<DraftSession>> {
        Ok(self
            .repo
            .get(id)
            .await
            .ok_or(DraftError::SessionNotFound(id))?)
    }

    async fn fetch_latest_revision(
        &self,
        cluster: &str,
        deployment_name: &str,
    ) -> Result<(DeploymentSchema, DeploymentRevisionSchema)> {
        let mut deployment = self.api.fetch_deployment(cluster, deployment_name).await?;
        let revision = deployment
            .latest_revision
            .take()
            .ok_or_else(|| anyhow!("Deployment {}/{} has no revision", cluster, deployment_name))?;
        Ok((deployment, revision))
    }

    /// Fetch cluster info and merge it into the latest snapshot. A failed
    /// fetch leaves the draft as it is.
    async fn refresh_cluster_info(&self, id: Uuid, cluster: &str) -> Result<Arc<DraftSession>> {
        match self.api.fetch_cluster(cluster).await {
            Ok(info) => {
                let (session, _) = self
                    .repo
                    .update(id, |s| Ok(s.reconciler.apply_cluster_info(&info)))
                    .await?;
                Ok(session)
            }
            Err(e) => {
                warn!(draft = %id, cluster = %cluster, error = %e, "failed to fetch cluster info");
                self.session(id).await
            }
        }
    }

    /// Manifests of every target's bento, fetched concurrently. Targets
    /// whose bento cannot be fetched are skipped.
    async fn fetch_manifests(
        &self,
        reconciler: &DraftReconciler,
    ) -> Vec<(usize, String, String, BentoManifestSchema)> {
        let wanted: Vec<(usize, String, String)> = reconciler
            .draft()
            .targets
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.bento_repository.is_empty() && !t.bento.is_empty())
            .map(|(i, t)| (i, t.bento_repository.clone(), t.bento.clone()))
            .collect();

        let fetched = join_all(wanted.iter().map(|(_, repository, version)| {
            self.api.fetch_bento(repository, version)
        }))
        .await;

        wanted
            .into_iter()
            .zip(fetched)
            .filter_map(|((index, repository, version), result)| match result {
                Ok(bento) => bento
                    .manifest
                    .map(|manifest| (index, repository, version, manifest)),
                Err(e) => {
                    warn!(
                        bento = %format!("{}:{}", repository, version),
                        error = %e,
                        "failed to fetch bento manifest"
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::core::state::runtime::draft::draft_session_repository::DraftSessionRepository;
    use crate::domain::deployment::model::bento_schema::{
        BentoRepositorySchema, BentoRunnerSchema, BentoWithRepositorySchema,
    };
    use crate::domain::deployment::model::cluster_schema::{ClusterConfigSchema, ClusterSchema};
    use crate::domain::deployment::model::deployment_schema::{
        DeploymentTargetConfig, DeploymentTargetSchema, DeploymentTargetType, EnvItem,
    };
    use crate::domain::deployment::reconcile::config_blob::BENTOML_CONFIG_ENV_KEY;
    use crate::domain::deployment::reconcile::draft_reconciler::NamespaceSource;

    /// Holds a bento fetch for `version` until released.
    struct BentoGate {
        version: String,
        entered: oneshot::Sender<()>,
        release: oneshot::Receiver<()>,
    }

    #[derive(Default)]
    struct MockYatai {
        bento_gate: Mutex<Option<BentoGate>>,
        clusters: Mutex<HashMap<String, ClusterSchema>>,
        bentos: Mutex<HashMap<String, BentoWithRepositorySchema>>,
        deployments: Mutex<HashMap<String, DeploymentSchema>>,
        created: Mutex<Vec<CreateDeploymentSchema>>,
        updated: Mutex<Vec<(String, UpdateDeploymentSchema)>>,
        reject_submissions: Mutex<bool>,
    }

    #[async_trait]
    impl YataiApi for MockYatai {
        async fn fetch_cluster(&self, cluster_name: &str) -> Result<ClusterSchema> {
            self.clusters
                .lock()
                .unwrap()
                .get(cluster_name)
                .cloned()
                .ok_or_else(|| anyhow!("cluster {cluster_name} unavailable"))
        }

        async fn fetch_bento(&self, repository: &str, version: &str) -> Result<BentoWithRepositorySchema> {
            let gate = {
                let mut slot = self.bento_gate.lock().unwrap();
                match slot.as_ref() {
                    Some(gate) if gate.version == version => slot.take(),
                    _ => None,
                }
            };
            if let Some(gate) = gate {
                let _ = gate.entered.send(());
                let _ = gate.release.await;
            }
            self.bentos
                .lock()
                .unwrap()
                .get(&format!("{repository}:{version}"))
                .cloned()
                .ok_or_else(|| anyhow!("bento {repository}:{version} unavailable"))
        }

        async fn fetch_deployment(&self, _cluster: &str, name: &str) -> Result<DeploymentSchema> {
            self.deployments
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("deployment {name} unavailable"))
        }

        async fn create_deployment(&self, _cluster: &str, body: &CreateDeploymentSchema) -> Result<DeploymentSchema> {
            if *self.reject_submissions.lock().unwrap() {
                return Err(anyhow!("rejected"));
            }
            self.created.lock().unwrap().push(body.clone());
            Ok(deployment(&body.name, None))
        }

        async fn update_deployment(
            &self,
            _cluster: &str,
            name: &str,
            body: &UpdateDeploymentSchema,
        ) -> Result<DeploymentSchema> {
            if *self.reject_submissions.lock().unwrap() {
                return Err(anyhow!("rejected"));
            }
            self.updated.lock().unwrap().push((name.to_string(), body.clone()));
            Ok(deployment(name, None))
        }
    }

    fn deployment(name: &str, revision: Option<DeploymentRevisionSchema>) -> DeploymentSchema {
        DeploymentSchema {
            uid: format!("uid-{name}"),
            name: name.to_string(),
            description: Some("existing".into()),
            kube_namespace: Some("ml-prod".into()),
            status: Some("running".into()),
            cluster: None,
            latest_revision: revision,
        }
    }

    fn bento(repository: &str, version: &str, runners: &[&str]) -> BentoWithRepositorySchema {
        BentoWithRepositorySchema {
            uid: None,
            version: version.to_string(),
            repository: BentoRepositorySchema {
                uid: None,
                name: repository.to_string(),
            },
            manifest: Some(BentoManifestSchema {
                service: None,
                bentoml_version: None,
                runners: runners
                    .iter()
                    .map(|name| BentoRunnerSchema {
                        name: name.to_string(),
                        runnable_type: None,
                        models: vec![],
                        resource_config: None,
                    })
                    .collect(),
            }),
        }
    }

    fn revision(uid: &str, blob: &str) -> DeploymentRevisionSchema {
        DeploymentRevisionSchema {
            uid: uid.to_string(),
            status: None,
            targets: vec![DeploymentTargetSchema {
                uid: None,
                target_type: DeploymentTargetType::Stable,
                bento: bento("iris", "v1", &["clf"]),
                canary_rules: None,
                config: Some(DeploymentTargetConfig {
                    envs: Some(vec![
                        EnvItem::new("A", "1"),
                        EnvItem::new(BENTOML_CONFIG_ENV_KEY, blob),
                    ]),
                    ..Default::default()
                }),
            }],
        }
    }

    fn service() -> (
        DeploymentDraftService<MockYatai, DraftSessionRepository>,
        Arc<MockYatai>,
        Arc<DraftSessionRepository>,
    ) {
        let api = Arc::new(MockYatai::default());
        let repo = DraftSessionRepository::new().shared();
        api.clusters.lock().unwrap().insert(
            "default".into(),
            ClusterSchema {
                uid: None,
                name: "default".into(),
                description: None,
                config: Some(ClusterConfigSchema {
                    default_deployment_kube_namespace: Some("ml".into()),
                }),
            },
        );
        api.bentos
            .lock()
            .unwrap()
            .insert("iris:v1".into(), bento("iris", "v1", &["clf", "tokenizer"]));
        (DeploymentDraftService::new(api.clone(), repo.clone()), api, repo)
    }

    fn edit(path: &str, value: Value) -> FieldEditRequest {
        FieldEditRequest {
            path: path.parse().unwrap(),
            value,
        }
    }

    #[tokio::test]
    async fn create_draft_derives_namespace_from_cluster() {
        let (svc, _, _) = service();

        let view = svc
            .create_draft(CreateDraftRequest {
                cluster_name: Some("default".into()),
            })
            .await
            .unwrap();

        assert_eq!(view.mode, DraftMode::New);
        assert_eq!(view.draft.kube_namespace.as_deref(), Some("ml"));
        assert_eq!(
            view.namespace_source,
            NamespaceSource::Derived {
                cluster: "default".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_cluster_does_not_block_editing() {
        let (svc, _, _) = service();
        let view = svc.create_draft(CreateDraftRequest::default()).await.unwrap();

        let view = svc
            .select_cluster(
                view.id,
                SelectClusterRequest {
                    cluster_name: "offline".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(view.draft.cluster_name.as_deref(), Some("offline"));
        assert_eq!(view.draft.kube_namespace, None);
    }

    #[tokio::test]
    async fn select_bento_seeds_runners_or_falls_back() {
        let (svc, _, _) = service();
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;

        let view = svc
            .select_bento(
                id,
                0,
                SelectBentoRequest {
                    repository: "iris".into(),
                    version: "v1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.draft.targets[0].config.runners.len(), 2);
        assert_eq!(view.editors[0].active_runner.as_deref(), Some("clf"));

        let view = svc
            .select_bento(
                id,
                0,
                SelectBentoRequest {
                    repository: "iris".into(),
                    version: "missing".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.draft.targets[0].bento, "missing");
        assert_eq!(view.draft.targets[0].config.runners.len(), 2);
    }

    #[tokio::test]
    async fn late_manifest_does_not_override_newer_selection() {
        let (svc, api, _) = service();
        api.bentos
            .lock()
            .unwrap()
            .insert("iris:v2".into(), bento("iris", "v2", &["tok"]));
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *api.bento_gate.lock().unwrap() = Some(BentoGate {
            version: "v1".into(),
            entered: entered_tx,
            release: release_rx,
        });
        let svc = Arc::new(svc);
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;

        let first = tokio::spawn({
            let svc = svc.clone();
            async move {
                svc.select_bento(
                    id,
                    0,
                    SelectBentoRequest {
                        repository: "iris".into(),
                        version: "v1".into(),
                    },
                )
                .await
            }
        });
        entered_rx.await.unwrap();
        svc.select_bento(
            id,
            0,
            SelectBentoRequest {
                repository: "iris".into(),
                version: "v2".into(),
            },
        )
        .await
        .unwrap();
        release_tx.send(()).unwrap();
        let view = first.await.unwrap().unwrap();

        let target = &view.draft.targets[0];
        assert_eq!(target.bento, "v2");
        assert_eq!(target.config.runners.keys().collect::<Vec<_>>(), vec!["tok"]);
        assert_eq!(view.editors[0].active_runner.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn open_and_reload_keep_in_progress_edits() {
        let (svc, api, _) = service();
        api.deployments
            .lock()
            .unwrap()
            .insert("iris-prod".into(), deployment("iris-prod", Some(revision("rev-1", "cfg"))));

        let view = svc
            .open_deployment_draft(OpenDeploymentDraftRequest {
                cluster_name: "default".into(),
                deployment_name: "iris-prod".into(),
            })
            .await
            .unwrap();
        assert_eq!(view.mode, DraftMode::Edit);
        assert_eq!(view.draft.targets[0].config.bentoml_config, "cfg");
        assert_eq!(view.editors[0].declared_runners, vec!["clf", "tokenizer"]);

        let id = view.id;
        svc.edit_field(id, edit("targets.0.config.enable_ingress", json!(false)))
            .await
            .unwrap();
        let view = svc.reload_revision(id).await.unwrap();
        assert_eq!(view.draft.targets[0].config.enable_ingress, Some(false));

        api.deployments
            .lock()
            .unwrap()
            .insert("iris-prod".into(), deployment("iris-prod", Some(revision("rev-2", "cfg2"))));
        let view = svc.reload_revision(id).await.unwrap();
        assert_eq!(view.last_revision_uid.as_deref(), Some("rev-2"));
        assert_eq!(view.draft.targets[0].config.bentoml_config, "cfg2");
    }

    #[tokio::test]
    async fn failed_edits_leave_session_unchanged() {
        let (svc, _, repo) = service();
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;
        let before = repo.get(id).await.unwrap();

        let err = svc
            .edit_field(id, edit("targets.5.bento", json!("v9")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DraftError>(),
            Some(DraftError::TargetOutOfRange { index: 5, len: 1 })
        ));
        assert_eq!(repo.get(id).await.unwrap().reconciler, before.reconciler);
    }

    #[tokio::test]
    async fn submit_creates_and_closes_the_draft() {
        let (svc, api, repo) = service();
        let id = svc
            .create_draft(CreateDraftRequest {
                cluster_name: Some("default".into()),
            })
            .await
            .unwrap()
            .id;
        svc.edit_field(id, edit("name", json!("iris-new"))).await.unwrap();
        svc.set_config_blob(
            id,
            0,
            ConfigBlobRequest {
                runner: None,
                value: Some("api_server:\n  workers: 2".into()),
            },
        )
        .await
        .unwrap();

        let deployment = svc.submit(id).await.unwrap();

        assert_eq!(deployment.name, "iris-new");
        assert!(repo.get(id).await.is_none());
        let created = api.created.lock().unwrap();
        let envs = created[0].targets[0]
            .config
            .as_ref()
            .and_then(|c| c.envs.clone())
            .unwrap();
        assert_eq!(
            envs,
            vec![EnvItem::new(BENTOML_CONFIG_ENV_KEY, "api_server:\n  workers: 2")]
        );
    }

    #[tokio::test]
    async fn submit_patches_existing_deployments() {
        let (svc, api, _) = service();
        api.deployments
            .lock()
            .unwrap()
            .insert("iris-prod".into(), deployment("iris-prod", Some(revision("rev-1", "cfg"))));
        let id = svc
            .open_deployment_draft(OpenDeploymentDraftRequest {
                cluster_name: "default".into(),
                deployment_name: "iris-prod".into(),
            })
            .await
            .unwrap()
            .id;

        svc.submit(id).await.unwrap();

        let updated = api.updated.lock().unwrap();
        assert_eq!(updated[0].0, "iris-prod");
        assert_eq!(updated[0].1.description.as_deref(), Some("existing"));
        assert!(api.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_in_flight_is_refused() {
        let (svc, _, repo) = service();
        let id = svc
            .create_draft(CreateDraftRequest {
                cluster_name: Some("default".into()),
            })
            .await
            .unwrap()
            .id;
        repo.update(id, |s| {
            s.submitting = true;
            Ok(())
        })
        .await
        .unwrap();

        let err = svc.submit(id).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<DraftError>(),
            Some(&DraftError::SubmissionInFlight)
        );
    }

    #[tokio::test]
    async fn rejected_submission_keeps_draft_and_clears_flag() {
        let (svc, api, repo) = service();
        *api.reject_submissions.lock().unwrap() = true;
        let id = svc
            .create_draft(CreateDraftRequest {
                cluster_name: Some("default".into()),
            })
            .await
            .unwrap()
            .id;
        svc.edit_field(id, edit("name", json!("iris-new"))).await.unwrap();

        assert!(svc.submit(id).await.is_err());

        let session = repo.get(id).await.unwrap();
        assert!(!session.submitting);
        assert_eq!(session.reconciler.draft().name, "iris-new");
    }

    #[tokio::test]
    async fn submit_requires_a_cluster() {
        let (svc, _, repo) = service();
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;

        let err = svc.submit(id).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DraftError>(),
            Some(DraftError::InvalidValue { .. })
        ));
        assert!(!repo.get(id).await.unwrap().submitting);
    }

    #[tokio::test]
    async fn new_drafts_cannot_be_reloaded() {
        let (svc, _, _) = service();
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;

        let err = svc.reload_revision(id).await.unwrap_err();

        assert_eq!(err.downcast_ref::<DraftError>(), Some(&DraftError::NotLinked));
    }

    #[tokio::test]
    async fn discard_removes_the_session() {
        let (svc, _, _) = service();
        let id = svc.create_draft(CreateDraftRequest::default()).await.unwrap().id;

        svc.discard(id).await.unwrap();

        let err = svc.get_draft(id).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<DraftError>(),
            Some(&DraftError::SessionNotFound(id))
        );
    }
}
