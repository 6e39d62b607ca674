//! Subcommands and their execution against an opened engine.

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use serde_json::{json, Value};

use ballot_engine::VotingEngine;
use ballot_store_lmdb::{check_data_dir, LmdbRoster, LmdbStore};
use ballot_types::{DelegationId, DeveloperSettings, Identity, OptionId, SystemClock, TopicId};

use crate::config::CliConfig;

pub type Engine = VotingEngine<LmdbStore, LmdbRoster>;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Maintain the roster of valid identities.
    Roster {
        #[command(subcommand)]
        action: RosterAction,
    },
    /// Set the numeric proxy count of an identity.
    Register {
        identity: Identity,
        #[arg(default_value_t = 0)]
        numeric_proxies: u64,
    },
    /// Manage owner and developer delegations.
    Delegate {
        #[command(subcommand)]
        action: DelegateAction,
    },
    /// Show or change the DEVELOPER aggregate settings.
    Developer {
        #[command(subcommand)]
        action: DeveloperAction,
    },
    /// Manage topics and their options.
    Topic {
        #[command(subcommand)]
        action: TopicAction,
    },
    /// Cast a vote for an already authenticated identity.
    Vote {
        topic: u64,
        identity: Identity,
        option: u64,
    },
    /// Resolved weight and eligibility of an identity.
    Weight { identity: Identity },
    /// Weight of every registered identity and the grand total.
    Quorum,
    /// Weighted results of a topic.
    Tally { topic: u64 },
    /// Verify the vote hash chain; exits non-zero if it is broken.
    Verify,
    /// Storage integrity report and chain head.
    Status,
    /// Clear all ballot state except the roster.
    Reset {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RosterAction {
    Add {
        #[arg(required = true)]
        identities: Vec<Identity>,
    },
    Remove { identity: Identity },
    List,
}

#[derive(Subcommand, Debug)]
pub enum DelegateAction {
    /// PRIMARY will represent DELEGATE.
    Owner { primary: Identity, delegate: Identity },
    /// Absorb IDENTITY into the DEVELOPER aggregate.
    Developer {
        identity: Identity,
        #[arg(long, default_value = "")]
        note: String,
    },
    Remove { id: u64 },
    List,
}

#[derive(Subcommand, Debug)]
pub enum DeveloperAction {
    Show,
    Set {
        #[arg(long)]
        active: bool,
        #[arg(long, default_value_t = 0)]
        base_weight: u64,
        #[arg(long, default_value_t = 0)]
        declared_proxies: u64,
        #[arg(long, default_value = "")]
        comment: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TopicAction {
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    AddOption { topic: u64, label: String },
    Open { topic: u64 },
    Close { topic: u64 },
    List,
}

/// What a command prints, and whether the process should exit successfully.
#[derive(Debug)]
pub struct Output {
    pub body: Value,
    pub success: bool,
}

impl Output {
    fn ok(body: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            body: serde_json::to_value(body)?,
            success: true,
        })
    }
}

/// Open the LMDB environment named by `config` and wrap it in an engine.
pub fn open_engine(config: &CliConfig) -> anyhow::Result<Engine> {
    check_data_dir(&config.data_dir).map_err(anyhow::Error::msg)?;
    let store = LmdbStore::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("cannot open database at {}", config.data_dir.display()))?;

    let report = store.check_integrity()?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::warn!(%error, "integrity check");
        }
    }
    let roster = store.roster();
    Ok(VotingEngine::new(
        store,
        roster,
        SystemClock,
        config.engine.clone(),
    ))
}

pub fn execute(engine: &Engine, command: Command) -> anyhow::Result<Output> {
    match command {
        Command::Roster { action } => roster(engine, action),
        Command::Register {
            identity,
            numeric_proxies,
        } => {
            engine.register(&identity, numeric_proxies)?;
            Output::ok(engine.registration(&identity)?)
        }
        Command::Delegate { action } => delegate(engine, action),
        Command::Developer { action } => developer(engine, action),
        Command::Topic { action } => topic(engine, action),
        Command::Vote {
            topic,
            identity,
            option,
        } => {
            let record = engine.cast_vote(TopicId::new(topic), &identity, OptionId::new(option))?;
            Output::ok(record)
        }
        Command::Weight { identity } => Output::ok(json!({
            "identity": identity,
            "weight": engine.resolve_weight(&identity)?,
            "eligibility": engine.eligibility(&identity)?,
        })),
        Command::Quorum => Output::ok(engine.quorum_report()?),
        Command::Tally { topic } => tally(engine, TopicId::new(topic)),
        Command::Verify => {
            let result = engine.verify_chain()?;
            Ok(Output {
                success: result.valid,
                body: serde_json::to_value(result)?,
            })
        }
        Command::Status => {
            let integrity = engine.store().check_integrity()?;
            let head = engine.votes()?.last().map(|v| (v.id, v.hash.to_hex()));
            Output::ok(json!({
                "data_dir": engine.store().path().display().to_string(),
                "healthy": integrity.is_healthy(),
                "databases_checked": integrity.databases_checked,
                "total_entries": integrity.total_entries,
                "errors": integrity.errors,
                "chain_head": head.map(|(id, hash)| json!({ "id": id, "hash": hash })),
            }))
        }
        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("refusing to reset without --yes");
            }
            engine.reset()?;
            Output::ok(json!({ "reset": true }))
        }
    }
}

fn roster(engine: &Engine, action: RosterAction) -> anyhow::Result<Output> {
    match action {
        RosterAction::Add { identities } => {
            let added = engine.roster().add(&identities)?;
            Output::ok(json!({ "added": added }))
        }
        RosterAction::Remove { identity } => {
            let removed = engine.roster().remove(&identity)?;
            Output::ok(json!({ "removed": removed }))
        }
        RosterAction::List => Output::ok(engine.roster().members()?),
    }
}

fn delegate(engine: &Engine, action: DelegateAction) -> anyhow::Result<Output> {
    match action {
        DelegateAction::Owner { primary, delegate } => {
            let id = engine.add_owner_delegation(&primary, &delegate)?;
            Output::ok(json!({ "delegation_id": id }))
        }
        DelegateAction::Developer { identity, note } => {
            let id = engine.add_developer_delegation(&identity, &note)?;
            Output::ok(json!({ "delegation_id": id }))
        }
        DelegateAction::Remove { id } => {
            engine.remove_delegation(DelegationId::new(id))?;
            Output::ok(json!({ "removed": id }))
        }
        DelegateAction::List => Output::ok(engine.delegations()?),
    }
}

fn developer(engine: &Engine, action: DeveloperAction) -> anyhow::Result<Output> {
    match action {
        DeveloperAction::Show => Output::ok(json!({
            "settings": engine.developer_settings()?,
            "weight": engine.developer_weight()?,
        })),
        DeveloperAction::Set {
            active,
            base_weight,
            declared_proxies,
            comment,
        } => {
            engine.set_developer_settings(&DeveloperSettings {
                active,
                base_weight,
                declared_proxy_count: declared_proxies,
                comment,
            })?;
            Output::ok(engine.developer_weight()?)
        }
    }
}

fn topic(engine: &Engine, action: TopicAction) -> anyhow::Result<Output> {
    match action {
        TopicAction::Create { title, description } => {
            Output::ok(engine.create_topic(&title, &description)?)
        }
        TopicAction::AddOption { topic, label } => {
            Output::ok(engine.add_option(TopicId::new(topic), &label)?)
        }
        TopicAction::Open { topic } => {
            Output::ok(engine.set_topic_open(TopicId::new(topic), true)?)
        }
        TopicAction::Close { topic } => {
            Output::ok(engine.set_topic_open(TopicId::new(topic), false)?)
        }
        TopicAction::List => Output::ok(engine.topics()?),
    }
}

fn tally(engine: &Engine, topic: TopicId) -> anyhow::Result<Output> {
    let totals = engine.tallies(topic)?;
    let rows: Vec<Value> = engine
        .options(topic)?
        .into_iter()
        .map(|option| {
            json!({
                "option_id": option.id,
                "label": option.label,
                "weight": totals.get(&option.id).copied().unwrap_or(0),
            })
        })
        .collect();
    Output::ok(json!({ "topic_id": topic, "results": rows }))
}
