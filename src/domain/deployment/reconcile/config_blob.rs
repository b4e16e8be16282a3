//! Translation between the draft's explicit `bentoml_config` fields and the
//! backend's env list, where the blob travels under a reserved key.
//!
//! Nothing outside this module looks at [`BENTOML_CONFIG_ENV_KEY`].

use std::collections::{BTreeMap, HashMap};

use crate::domain::deployment::model::deployment_schema::{
    CreateDeploymentTargetSchema, DeploymentTargetConfig, DeploymentTargetRunnerConfig,
    DeploymentTargetSchema, DeploymentTargetType, EnvItem,
};
use crate::domain::deployment::model::draft::{RunnerConfigDraft, TargetConfigDraft, TargetDraft};

pub const BENTOML_CONFIG_ENV_KEY: &str = "BENTOML_CONFIG_OPTIONS";

/// Value of the first sentinel entry, if any.
pub fn extract_config_blob(envs: &[EnvItem]) -> Option<&str> {
    envs.iter()
        .find(|env| env.key == BENTOML_CONFIG_ENV_KEY)
        .map(|env| env.value.as_str())
}

/// Write `blob` into `envs` under the sentinel key.
///
/// Non-empty: the first sentinel entry is overwritten in place (or one is
/// appended) and any further sentinel entries are dropped. Empty: every
/// sentinel entry is removed. Other entries keep their order and values.
pub fn apply_config_blob(envs: &mut Vec<EnvItem>, blob: &str) {
    if blob.is_empty() {
        envs.retain(|env| env.key != BENTOML_CONFIG_ENV_KEY);
        return;
    }

    let mut seen = false;
    envs.retain_mut(|env| {
        if env.key != BENTOML_CONFIG_ENV_KEY {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        env.value = blob.to_string();
        true
    });

    if !seen {
        envs.push(EnvItem::new(BENTOML_CONFIG_ENV_KEY, blob));
    }
}

/// Enforce unique keys: the first occurrence keeps its slot and takes the
/// value of the last occurrence.
pub fn dedupe_env_keys(envs: &mut Vec<EnvItem>) {
    let mut last_value: HashMap<String, String> = HashMap::with_capacity(envs.len());
    for env in envs.iter() {
        last_value.insert(env.key.clone(), env.value.clone());
    }
    if last_value.len() == envs.len() {
        return;
    }

    let mut deduped = Vec::with_capacity(last_value.len());
    for env in envs.drain(..) {
        if let Some(value) = last_value.remove(&env.key) {
            deduped.push(EnvItem::new(env.key, value));
        }
    }
    *envs = deduped;
}

fn without_sentinel(envs: Option<Vec<EnvItem>>) -> Vec<EnvItem> {
    envs.unwrap_or_default()
        .into_iter()
        .filter(|env| env.key != BENTOML_CONFIG_ENV_KEY)
        .collect()
}

/// Project a stored target config into its draft form, lifting the sentinel
/// value into `bentoml_config`.
///
/// A runner whose blob matches the target's (or has none) shares the target
/// blob; only a differing value becomes a runner-specific blob.
pub fn decode_target_config(config: Option<&DeploymentTargetConfig>) -> TargetConfigDraft {
    let Some(config) = config else {
        return TargetConfigDraft::default();
    };

    let target_blob = config
        .envs
        .as_deref()
        .and_then(extract_config_blob)
        .unwrap_or_default()
        .to_string();

    let runners = config
        .runners
        .iter()
        .flatten()
        .map(|(name, runner)| {
            let runner_blob = runner
                .envs
                .as_deref()
                .and_then(extract_config_blob)
                .filter(|blob| *blob != target_blob)
                .map(str::to_string);
            let draft = RunnerConfigDraft {
                hpa_conf: runner.hpa_conf.clone(),
                resources: runner.resources.clone(),
                envs: without_sentinel(runner.envs.clone()),
                bentoml_config: runner_blob,
            };
            (name.clone(), draft)
        })
        .collect();

    TargetConfigDraft {
        hpa_conf: config.hpa_conf.clone(),
        resources: config.resources.clone(),
        envs: without_sentinel(config.envs.clone()),
        runners,
        enable_ingress: config.enable_ingress,
        bentoml_config: target_blob,
    }
}

pub fn decode_target(target: &DeploymentTargetSchema) -> TargetDraft {
    TargetDraft {
        target_type: target.target_type,
        bento_repository: target.bento.repository.name.clone(),
        bento: target.bento.version.clone(),
        canary_rules: target.canary_rules.clone(),
        config: decode_target_config(target.config.as_ref()),
    }
}

/// Build the wire config: dedupe env keys, then reconcile the sentinel entry
/// in the target list and in every runner list.
pub fn encode_target_config(config: &TargetConfigDraft) -> DeploymentTargetConfig {
    let mut envs = config.envs.clone();
    dedupe_env_keys(&mut envs);
    apply_config_blob(&mut envs, &config.bentoml_config);

    let runners: BTreeMap<String, DeploymentTargetRunnerConfig> = config
        .runners
        .iter()
        .map(|(name, runner)| {
            let blob = runner
                .bentoml_config
                .as_deref()
                .unwrap_or(&config.bentoml_config);
            let mut envs = runner.envs.clone();
            dedupe_env_keys(&mut envs);
            apply_config_blob(&mut envs, blob);
            let wire = DeploymentTargetRunnerConfig {
                resources: runner.resources.clone(),
                hpa_conf: runner.hpa_conf.clone(),
                envs: Some(envs),
            };
            (name.clone(), wire)
        })
        .collect();

    DeploymentTargetConfig {
        hpa_conf: config.hpa_conf.clone(),
        resources: config.resources.clone(),
        envs: Some(envs),
        runners: Some(runners),
        enable_ingress: config.enable_ingress,
    }
}

pub fn encode_target(target: &TargetDraft) -> CreateDeploymentTargetSchema {
    let canary_rules = match target.target_type {
        DeploymentTargetType::Canary => target.canary_rules.clone(),
        DeploymentTargetType::Stable => None,
    };

    CreateDeploymentTargetSchema {
        target_type: target.target_type,
        bento_repository: target.bento_repository.clone(),
        bento: target.bento.clone(),
        canary_rules,
        config: Some(encode_target_config(&target.config)),
    }
}
