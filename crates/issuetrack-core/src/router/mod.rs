//! Route/state evaluation for the issue views.
//!
//! [`StateTable`] declares the six issue states; [`Router`] evaluates it.
//! Entering a state checks authorities, then runs every resolve of every
//! state being (re)entered, root first. Only when all of them succeed does
//! the state become current, so a failed resolve leaves the router where it
//! was.
//!
//! Navigation is split in two so hosts can run the network part on another
//! task:
//!
//! 1. [`Router::prepare`] checks authorities and runs the synchronous
//!    resolves (translations, paging, previous state).
//! 2. [`PendingTransition::resolve`] fetches entities.
//! 3. [`Router::commit`] makes the state current, unless another
//!    navigation was prepared in the meantime.
//!
//! [`Router::go`] runs all three in sequence.

mod states;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::error::CoreError;
use crate::i18n::{TranslationSource, Translations};
use crate::modal::ModalExit;
use crate::model::{DEFAULT_PAGE, DEFAULT_SORT, Issue, IssueId, PagingParams};
use crate::resource::IssueResource;

pub use states::{
    ExitRule, ExitTarget, ModalSize, Resolve, StateDef, StateName, StateTable, View,
};

// ── Params ──────────────────────────────────────────────────────────

/// URL parameters shared by the issue states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateParams {
    pub id: Option<IssueId>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

impl StateParams {
    pub fn with_id(id: IssueId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// List params; defaults are left out.
    pub fn from_paging(paging: &PagingParams) -> Self {
        Self {
            id: None,
            page: Some(paging.page.to_string()),
            sort: Some(paging.sort.clone()),
            search: paging.search.clone(),
        }
        .normalized()
    }

    /// Keep the list params, replace the id.
    pub fn and_id(mut self, id: IssueId) -> Self {
        self.id = Some(id);
        self
    }

    /// Drop values equal to their defaults.
    pub fn normalized(mut self) -> Self {
        let page = DEFAULT_PAGE.to_string();
        self.page = self.page.filter(|p| !p.is_empty() && *p != page);
        self.sort = self.sort.filter(|s| !s.is_empty() && s != DEFAULT_SORT);
        self.search = self.search.filter(|s| !s.is_empty());
        self
    }

    /// Value of a named param with defaults applied.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "id" => self.id.map(|id| id.to_string()),
            "page" => Some(
                self.page
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAGE.to_string()),
            ),
            "sort" => Some(self.sort.clone().unwrap_or_else(|| DEFAULT_SORT.into())),
            "search" => self.search.clone(),
            _ => None,
        }
    }

    pub fn paging(&self) -> PagingParams {
        PagingParams::from_query(
            self.page.as_deref(),
            self.sort.as_deref(),
            self.search.as_deref(),
        )
    }
}

/// Where the user came from; the detail page's back button uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousState {
    pub name: String,
    pub params: StateParams,
    pub url: String,
}

impl PreviousState {
    /// The list page with default params.
    pub fn list() -> Self {
        Self {
            name: StateName::Issue.to_string(),
            params: StateParams::default(),
            url: "/issue".into(),
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// Values produced by one state's resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub paging: Option<PagingParams>,
    pub entity: Option<Issue>,
    pub previous_state: Option<PreviousState>,
}

/// One state (re)entered by a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entered {
    pub state: StateName,
    pub resolved: Resolved,
}

/// A fully resolved navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub state: StateName,
    pub params: StateParams,
    /// States whose resolves ran, root first. Already-active ancestors
    /// that were kept are not listed.
    pub entered: Vec<Entered>,
    generation: u64,
}

impl Activation {
    pub fn resolved(&self, state: StateName) -> Option<&Resolved> {
        self.entered
            .iter()
            .find(|e| e.state == state)
            .map(|e| &e.resolved)
    }

    /// The entity resolved for the target state.
    pub fn entity(&self) -> Option<&Issue> {
        self.resolved(self.state).and_then(|r| r.entity.as_ref())
    }

    pub fn is_entered(&self, state: StateName) -> bool {
        self.resolved(state).is_some()
    }
}

/// A navigation implied by a modal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub to: StateName,
    pub reload: bool,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No issue view matches {url}")]
    UnknownUrl { url: String },

    #[error("State {state} requires one of {required:?}")]
    Forbidden {
        state: StateName,
        required: Vec<String>,
    },

    #[error("Could not enter {state}: {source}")]
    Resolve {
        state: StateName,
        #[source]
        source: CoreError,
    },
}

// ── Pending navigation ──────────────────────────────────────────────

#[derive(Debug, Clone)]
enum EntityResolve {
    None,
    Blank,
    Fetch(IssueId),
}

#[derive(Debug, Clone)]
struct PendingStep {
    state: StateName,
    paging: Option<PagingParams>,
    entity: EntityResolve,
    previous_state: Option<PreviousState>,
}

/// A navigation whose synchronous resolves are done.
#[derive(Debug)]
pub struct PendingTransition<R> {
    generation: u64,
    state: StateName,
    params: StateParams,
    steps: Vec<PendingStep>,
    resource: R,
}

impl<R: IssueResource> PendingTransition<R> {
    pub fn state(&self) -> StateName {
        self.state
    }

    /// Fetch entities for every step, in order.
    pub async fn resolve(self) -> Result<Activation, RouteError> {
        let mut entered = Vec::with_capacity(self.steps.len());
        for step in self.steps {
            let entity = match step.entity {
                EntityResolve::None => None,
                EntityResolve::Blank => Some(Issue::blank()),
                EntityResolve::Fetch(id) => {
                    Some(self.resource.get(id).await.map_err(|source| {
                        RouteError::Resolve {
                            state: step.state,
                            source,
                        }
                    })?)
                }
            };
            entered.push(Entered {
                state: step.state,
                resolved: Resolved {
                    paging: step.paging,
                    entity,
                    previous_state: step.previous_state,
                },
            });
        }
        Ok(Activation {
            state: self.state,
            params: self.params,
            entered,
            generation: self.generation,
        })
    }
}

// ── Router ──────────────────────────────────────────────────────────

/// Evaluates the state table for one user session.
pub struct Router<R> {
    table: StateTable,
    resource: R,
    source: Arc<dyn TranslationSource>,
    translations: Translations,
    authorities: Vec<String>,
    current: Option<(StateName, StateParams)>,
    generation: u64,
}

impl<R: IssueResource + Clone> Router<R> {
    pub fn new(
        resource: R,
        source: Arc<dyn TranslationSource>,
        authorities: Vec<String>,
        language: &str,
    ) -> Self {
        Self {
            table: StateTable::issues(),
            resource,
            source,
            translations: Translations::new(language),
            authorities,
            current: None,
            generation: 0,
        }
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn current(&self) -> Option<StateName> {
        self.current.as_ref().map(|(name, _)| *name)
    }

    pub fn params(&self) -> Option<&StateParams> {
        self.current.as_ref().map(|(_, params)| params)
    }

    /// Whether `state` is the current state or one of its ancestors.
    pub fn is_active(&self, state: StateName) -> bool {
        self.current()
            .is_some_and(|current| self.table.is_within(current, state))
    }

    // ── URLs ─────────────────────────────────────────────────────────

    /// Map a URL (path plus optional query) to a state. `/issue/new` is
    /// matched before `/issue/{id}`.
    pub fn match_url(&self, url: &str) -> Option<(StateName, StateParams)> {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let (state, id) = match segments.as_slice() {
            ["issue"] => (StateName::Issue, None),
            ["issue", "new"] => (StateName::IssueNew, None),
            ["issue", id] => (StateName::IssueDetail, Some(id.parse().ok()?)),
            ["issue", id, "detail", "edit"] => (StateName::IssueDetailEdit, Some(id.parse().ok()?)),
            ["issue", id, "edit"] => (StateName::IssueEdit, Some(id.parse().ok()?)),
            ["issue", id, "delete"] => (StateName::IssueDelete, Some(id.parse().ok()?)),
            _ => return None,
        };

        let mut params = StateParams {
            id,
            ..StateParams::default()
        };
        if self.table.is_within(state, StateName::Issue) {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                match key.as_ref() {
                    "page" => params.page = Some(value.into_owned()),
                    "sort" => params.sort = Some(value.into_owned()),
                    "search" => params.search = Some(value.into_owned()),
                    _ => {}
                }
            }
        }
        Some((state, params.normalized()))
    }

    /// URL for `state`. `None` when the state needs an id and `params`
    /// has none. List defaults are left out of the query.
    pub fn href(&self, state: StateName, params: &StateParams) -> Option<String> {
        let def = self.table.get(state);
        let pattern = def.url.split_once('?').map_or(def.url, |(path, _)| path);
        let mut url = if pattern.contains("{id}") {
            pattern.replace("{id}", &params.id?.to_string())
        } else {
            pattern.to_owned()
        };

        if self.table.is_within(state, StateName::Issue) {
            let params = params.clone().normalized();
            let mut query = form_urlencoded::Serializer::new(String::new());
            if let Some(page) = &params.page {
                query.append_pair("page", page);
            }
            if let Some(sort) = &params.sort {
                query.append_pair("sort", sort);
            }
            if let Some(search) = &params.search {
                query.append_pair("search", search);
            }
            let query = query.finish();
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
        }
        Some(url)
    }

    // ── Navigation ───────────────────────────────────────────────────

    pub async fn go(
        &mut self,
        state: StateName,
        params: StateParams,
    ) -> Result<Activation, RouteError> {
        self.go_with(state, params, false).await
    }

    /// Navigate to `url`.
    pub async fn navigate(&mut self, url: &str) -> Result<Activation, RouteError> {
        let (state, params) = self.match_url(url).ok_or_else(|| RouteError::UnknownUrl {
            url: url.to_owned(),
        })?;
        self.go(state, params).await
    }

    /// Follow a modal exit, inheriting the current params.
    pub async fn follow(&mut self, transition: Transition) -> Result<Activation, RouteError> {
        let params = self.params().cloned().unwrap_or_default();
        self.go_with(transition.to, params, transition.reload).await
    }

    async fn go_with(
        &mut self,
        state: StateName,
        params: StateParams,
        reload: bool,
    ) -> Result<Activation, RouteError> {
        let pending = self.prepare(state, params, reload)?;
        let activation = pending.resolve().await?;
        self.commit(&activation);
        Ok(activation)
    }

    /// Check authorities and run the synchronous resolves. With `reload`,
    /// already-active states are re-entered too.
    pub fn prepare(
        &mut self,
        state: StateName,
        params: StateParams,
        reload: bool,
    ) -> Result<PendingTransition<R>, RouteError> {
        let params = params.normalized();
        let chain = self.table.chain(state);

        for def in &chain {
            let allowed = def.authorities.is_empty()
                || def
                    .authorities
                    .iter()
                    .any(|required| self.authorities.iter().any(|held| held == required));
            if !allowed {
                return Err(RouteError::Forbidden {
                    state: def.name,
                    required: def.authorities.iter().map(|a| (*a).to_owned()).collect(),
                });
            }
        }

        let mut steps = Vec::new();
        for def in chain {
            if !reload && self.is_kept(def, &params) {
                continue;
            }
            steps.push(self.prepare_step(def, &params)?);
        }

        self.generation += 1;
        debug!(%state, steps = steps.len(), "transition prepared");
        Ok(PendingTransition {
            generation: self.generation,
            state,
            params,
            steps,
            resource: self.resource.clone(),
        })
    }

    /// Make a resolved navigation current. Returns `false` if a newer
    /// navigation was prepared after this one.
    pub fn commit(&mut self, activation: &Activation) -> bool {
        if activation.generation != self.generation {
            debug!(state = %activation.state, "dropping superseded transition");
            return false;
        }
        info!(state = %activation.state, "entered state");
        self.current = Some((activation.state, activation.params.clone()));
        true
    }

    /// Where a modal exit leads from `state`. `None` for page states.
    pub fn exit_transition(&self, state: StateName, exit: ModalExit) -> Option<Transition> {
        let def = self.table.get(state);
        let rule = match exit {
            ModalExit::Confirm => def.on_confirm,
            ModalExit::Cancel => def.on_cancel,
        }?;
        let to = match rule.target {
            ExitTarget::Parent => def.parent?,
            ExitTarget::State(name) => name,
        };
        Some(Transition {
            to,
            reload: rule.reload,
        })
    }

    fn is_kept(&self, def: &StateDef, params: &StateParams) -> bool {
        let Some((_, current_params)) = &self.current else {
            return false;
        };
        self.is_active(def.name)
            && def
                .params
                .iter()
                .all(|key| current_params.get(key) == params.get(key))
    }

    fn prepare_step(
        &mut self,
        def: &StateDef,
        params: &StateParams,
    ) -> Result<PendingStep, RouteError> {
        let mut step = PendingStep {
            state: def.name,
            paging: None,
            entity: EntityResolve::None,
            previous_state: None,
        };
        let fail = |source| RouteError::Resolve {
            state: def.name,
            source,
        };

        for resolve in def.resolves {
            match resolve {
                Resolve::Translations(parts) => {
                    for part in *parts {
                        self.translations.add_part(part);
                    }
                    self.translations
                        .refresh(self.source.as_ref())
                        .map_err(fail)?;
                }
                Resolve::PagingParams => step.paging = Some(params.paging()),
                Resolve::Entity => {
                    let id = params.id.ok_or(CoreError::MissingId {
                        operation: "resolved",
                    });
                    step.entity = EntityResolve::Fetch(id.map_err(fail)?);
                }
                Resolve::BlankEntity => step.entity = EntityResolve::Blank,
                Resolve::PreviousState => step.previous_state = Some(self.previous_state()),
            }
        }
        Ok(step)
    }

    fn previous_state(&self) -> PreviousState {
        let Some((name, params)) = &self.current else {
            return PreviousState::list();
        };
        PreviousState {
            name: name.to_string(),
            params: params.clone(),
            url: self.href(*name, params).unwrap_or_else(|| "/issue".into()),
        }
    }
}
