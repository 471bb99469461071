use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const WEIGHT_TOLERANCE: f32 = 1e-6;

/// Retrieval parameters for one engine instance. Validated once at
/// construction; never re-checked on the query path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Fusion weight of the dense (embedding) side. Must sum to 1.0
    /// with `sparse_weight`.
    pub dense_weight: f32,
    pub sparse_weight: f32,
    /// Each index is asked for `top_k * overfetch_factor` candidates so
    /// the merger has material before truncation.
    pub overfetch_factor: usize,
    /// Minimum fused score a candidate must reach. 0.0 keeps everything.
    pub similarity_threshold: f32,
    pub bm25_k1: f32,
    pub bm25_b: f32,
    /// Upper bound on one embedding-provider call.
    pub embed_timeout_ms: u64,
    pub expansion_enabled: bool,
    /// Phrase -> related terms, applied at most once per query.
    pub expansion: HashMap<String, Vec<String>>,
    /// Optional TOML file with extra expansion entries, merged over the
    /// built-in table. Relative paths resolve against the config dir.
    pub expansion_file: Option<String>,
    pub rerank_enabled: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_weight: 0.7,
            sparse_weight: 0.3,
            overfetch_factor: 3,
            similarity_threshold: 0.0,
            bm25_k1: 1.2,
            bm25_b: 0.75,
            embed_timeout_ms: 5_000,
            expansion_enabled: true,
            expansion: default_expansion_table(),
            expansion_file: None,
            rerank_enabled: false,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dense_weight < 0.0 || self.sparse_weight < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must be non-negative, got dense={} sparse={}",
                self.dense_weight, self.sparse_weight
            )));
        }
        let sum = self.dense_weight + self.sparse_weight;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must sum to 1.0, got {sum}"
            )));
        }
        if self.overfetch_factor == 0 {
            return Err(Error::InvalidConfig(
                "overfetch_factor must be at least 1".to_string(),
            ));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(Error::InvalidConfig(
                "similarity_threshold must be finite".to_string(),
            ));
        }
        if self.bm25_k1 < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "bm25_k1 must be non-negative, got {}",
                self.bm25_k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(Error::InvalidConfig(format!(
                "bm25_b must be in [0, 1], got {}",
                self.bm25_b
            )));
        }
        if self.embed_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "embed_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Merges extra phrase -> terms entries from `expansion_file`, if
    /// set. File entries win over built-in ones.
    pub fn merge_expansion_file(&mut self, base: &Path) -> anyhow::Result<()> {
        let Some(file) = self.expansion_file.clone() else {
            return Ok(());
        };
        let path = resolve_with_base(base, &file);
        let extra: HashMap<String, Vec<String>> =
            Figment::new().merge(Toml::file(&path)).extract()?;
        if extra.is_empty() {
            anyhow::bail!("expansion file {} is missing or empty", path.display());
        }
        for (phrase, terms) in extra {
            self.expansion.insert(phrase.to_lowercase(), terms);
        }
        Ok(())
    }
}

/// Domain phrase -> canonical operations vocabulary. Tunable data, not
/// a contract; callers replace or extend it through configuration.
pub fn default_expansion_table() -> HashMap<String, Vec<String>> {
    let entries: [(&str, &[&str]); 11] = [
        (
            "create a topic",
            &["kafka-topics.sh", "topic creation", "new topic", "--create"],
        ),
        (
            "create topic",
            &["kafka-topics.sh", "topic creation", "new topic", "--create"],
        ),
        (
            "delete topic",
            &["kafka-topics.sh", "topic deletion", "remove topic", "--delete"],
        ),
        ("list topics", &["kafka-topics.sh", "show topics", "--list"]),
        (
            "consumer group",
            &["kafka-consumer-groups.sh", "consumer offset", "group management"],
        ),
        (
            "producer",
            &["kafka-console-producer.sh", "produce messages", "send messages"],
        ),
        (
            "consumer",
            &["kafka-console-consumer.sh", "consume messages", "read messages"],
        ),
        (
            "configuration",
            &["broker config", "server.properties", "configure"],
        ),
        (
            "retention",
            &["log retention", "retention policy", "log.retention"],
        ),
        (
            "partition",
            &["partitioning", "partition assignment", "num.partitions"],
        ),
        (
            "replication",
            &["replication factor", "replica", "replicas"],
        ),
    ];
    entries
        .into_iter()
        .map(|(phrase, terms)| {
            (
                phrase.to_string(),
                terms.iter().map(|t| (*t).to_string()).collect(),
            )
        })
        .collect()
}

/// Layered configuration: `config.toml` + `config.<env>.toml` + `RAGDB_*`
/// env vars, selected by `RUST_ENV`.
pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => {
                figment = figment.merge(Toml::file(dir.join("config.dev.toml")));
            }
            "prod" | "production" => {
                figment = figment.merge(Toml::file(dir.join("config.prod.toml")));
            }
            "test" | "testing" => {
                figment = figment.merge(Toml::file(dir.join("config.test.toml")));
            }
            _ => {}
        }
        figment = figment.merge(Env::prefixed("RAGDB_"));

        Ok(Self {
            figment,
            base: dir.to_path_buf(),
        })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts the `[retrieval]` section over built-in defaults and
    /// validates it. An absent section yields the defaults.
    pub fn retrieval(&self) -> anyhow::Result<RetrievalConfig> {
        let mut cfg: RetrievalConfig = if self.figment.find_value("retrieval").is_ok() {
            self.figment.extract_inner("retrieval")?
        } else {
            RetrievalConfig::default()
        };
        cfg.merge_expansion_file(&self.base)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
