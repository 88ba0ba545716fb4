//! Console gateway: JSON-line messages in on stdin, JSON-line replies out on
//! stdout.
//!
//! # Design
//! - Each decoded line is handled on its own task so a slow role lookup never
//!   holds up the next message.
//! - Replies are written by the reading loop as handlers finish; output order
//!   follows completion, and every reply carries its event identifier.
//! - The role catalog is fixed at startup; memberships live in memory only.
//! - A reload request re-reads the configuration document between messages;
//!   a document that fails to load leaves the committed one in place.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use rolecall_core::{CommandRouter, InboundMessage, Reply, RoleDirectory, RoleHandle};
use rolecall_config::ConfigStore;
use rolecall_telemetry::set_event_context;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, field, info, info_span, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// One `community:name` entry of the console role catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoleSpec {
    pub(crate) community: String,
    pub(crate) name: String,
}

impl FromStr for RoleSpec {
    type Err = AppError;

    fn from_str(raw: &str) -> AppResult<Self> {
        let Some((community, name)) = raw.split_once(':') else {
            return Err(AppError::invalid_config("role", "missing_separator", raw));
        };
        let (community, name) = (community.trim(), name.trim());
        if community.is_empty() {
            return Err(AppError::invalid_config("role", "empty_community", raw));
        }
        if name.is_empty() {
            return Err(AppError::invalid_config("role", "empty_name", raw));
        }
        Ok(Self {
            community: community.to_string(),
            name: name.to_string(),
        })
    }
}

/// Argument parser for `--role`.
pub(crate) fn parse_role_spec(input: &str) -> Result<RoleSpec, String> {
    input
        .parse()
        .map_err(|_| format!("invalid role '{input}': expected <community>:<name>"))
}

type Memberships = BTreeMap<(String, String), BTreeSet<String>>;

/// In-memory role directory backing the console gateway.
#[derive(Debug, Default)]
pub(crate) struct ConsoleDirectory {
    catalog: BTreeMap<String, BTreeSet<String>>,
    memberships: Mutex<Memberships>,
}

impl ConsoleDirectory {
    pub(crate) fn new(roles: &[RoleSpec]) -> Self {
        let mut catalog: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for role in roles {
            catalog
                .entry(role.community.clone())
                .or_default()
                .insert(role.name.clone());
        }
        Self {
            catalog,
            memberships: Mutex::default(),
        }
    }

    pub(crate) fn role_count(&self) -> usize {
        self.catalog.values().map(BTreeSet::len).sum()
    }

    fn memberships(&self) -> Result<MutexGuard<'_, Memberships>> {
        self.memberships
            .lock()
            .map_err(|_| anyhow!("membership state poisoned"))
    }

    fn ensure_known(&self, community: &str, role: &RoleHandle) -> Result<()> {
        let known = self
            .catalog
            .get(community)
            .is_some_and(|roles| roles.contains(&role.name));
        if !known {
            bail!("role {} is not in the catalog of {community}", role.name);
        }
        Ok(())
    }
}

#[async_trait]
impl RoleDirectory for ConsoleDirectory {
    async fn resolve_role(&self, community: &str, name: &str) -> Result<Option<RoleHandle>> {
        let found = self
            .catalog
            .get(community)
            .is_some_and(|roles| roles.contains(name));
        Ok(found.then(|| RoleHandle {
            id: format!("{community}:{name}"),
            name: name.to_string(),
        }))
    }

    async fn grant_role(&self, community: &str, actor: &str, role: &RoleHandle) -> Result<()> {
        self.ensure_known(community, role)?;
        self.memberships()?
            .entry((community.to_string(), actor.to_string()))
            .or_default()
            .insert(role.name.clone());
        Ok(())
    }

    async fn revoke_role(&self, community: &str, actor: &str, role: &RoleHandle) -> Result<()> {
        self.ensure_known(community, role)?;
        let mut memberships = self.memberships()?;
        let key = (community.to_string(), actor.to_string());
        if let Some(roles) = memberships.get_mut(&key) {
            roles.remove(&role.name);
            if roles.is_empty() {
                memberships.remove(&key);
            }
        }
        Ok(())
    }
}

/// One line written to the gateway output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConsoleReply {
    pub(crate) event_id: String,
    #[serde(flatten)]
    pub(crate) reply: Reply,
}

/// Counters reported when the gateway input closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GatewayStats {
    pub(crate) replies: usize,
    pub(crate) ignored: usize,
    pub(crate) malformed: usize,
    pub(crate) reloads: usize,
}

/// Serve messages from `input` until it closes, writing replies to `output`.
///
/// Every value received on `reloads` re-reads `store` from disk.
pub(crate) async fn serve<R, W>(
    router: &CommandRouter,
    store: &ConfigStore,
    mut reloads: mpsc::Receiver<()>,
    input: R,
    mut output: W,
) -> AppResult<GatewayStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handlers = JoinSet::new();
    let mut stats = GatewayStats::default();
    let mut input_open = true;
    let mut reloads_open = true;

    while input_open || !handlers.is_empty() {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line.map_err(|source| AppError::io("console.read", source))? {
                    Some(line) => accept_line(&mut handlers, &mut stats, router, &line),
                    None => input_open = false,
                }
            }
            Some(joined) = handlers.join_next(), if !handlers.is_empty() => {
                match joined {
                    Ok(Some(reply)) => {
                        write_reply(&mut output, &reply).await?;
                        stats.replies += 1;
                    }
                    Ok(None) => stats.ignored += 1,
                    Err(err) => warn!(error = %err, "message handler task failed"),
                }
            }
            signal = reloads.recv(), if reloads_open => {
                match signal {
                    Some(()) => match store.reload().await {
                        Ok(_) => stats.reloads += 1,
                        Err(err) => warn!(error = %err, "configuration reload failed; keeping committed document"),
                    },
                    None => reloads_open = false,
                }
            }
        }
    }

    output
        .flush()
        .await
        .map_err(|source| AppError::io("console.flush", source))?;
    info!(
        replies = stats.replies,
        ignored = stats.ignored,
        malformed = stats.malformed,
        reloads = stats.reloads,
        "console input closed"
    );
    Ok(stats)
}

fn accept_line(
    handlers: &mut JoinSet<Option<ConsoleReply>>,
    stats: &mut GatewayStats,
    router: &CommandRouter,
    line: &str,
) {
    if line.trim().is_empty() {
        return;
    }
    let message: InboundMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "skipping malformed console line");
            stats.malformed += 1;
            return;
        }
    };

    let event_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "console.message",
        event_id = field::Empty,
        community = field::Empty
    );
    set_event_context(&span, &event_id, message.community.as_deref());

    let router = router.clone();
    let handler = async move {
        let reply = router.route(&message).await?;
        debug!("reply ready");
        Some(ConsoleReply { event_id, reply })
    };
    handlers.spawn(handler.instrument(span));
}

async fn write_reply<W>(output: &mut W, reply: &ConsoleReply) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec(reply).map_err(|source| AppError::Encode { source })?;
    encoded.push(b'\n');
    output
        .write_all(&encoded)
        .await
        .map_err(|source| AppError::io("console.write", source))
}
