//! Admin actions for bulk operations on selected rows.
//!
//! This module provides the [`AdminAction`] trait, the built-in
//! [`DeleteSelectedAction`], and [`SetDraftAction`], which backs the movie
//! list's "publish" and "unpublish" actions.

use async_trait::async_trait;
use cinema_core::CinemaResult;
use serde::Serialize;
use serde_json::Value;

use crate::db::AdminDbExecutor;
use crate::messages::{deleted_message, Message};
use crate::model_admin::ModelAdmin;

/// The message shown when an action is submitted without a selection.
pub const NOTHING_SELECTED: &str =
    "Items must be selected in order to perform actions on them. No items have been changed.";

/// The result of executing an admin action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    /// Whether the action ran.
    pub success: bool,
    /// Messages for the user.
    pub messages: Vec<Message>,
    /// The number of rows affected.
    pub affected_count: usize,
}

impl ActionResult {
    /// Creates a successful result with one message.
    pub fn success(message: Message, affected_count: usize) -> Self {
        Self {
            success: true,
            messages: vec![message],
            affected_count,
        }
    }

    /// Creates a result for an action that did not run.
    pub fn failure(message: Message) -> Self {
        Self {
            success: false,
            messages: vec![message],
            affected_count: 0,
        }
    }
}

/// A bulk operation offered on a model's list view.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use cinema_admin::actions::{ActionResult, AdminAction};
/// use cinema_admin::db::AdminDbExecutor;
/// use cinema_admin::messages::Message;
/// use cinema_admin::model_admin::ModelAdmin;
/// use cinema_core::CinemaResult;
///
/// struct CountSelected;
///
/// #[async_trait]
/// impl AdminAction for CountSelected {
///     fn name(&self) -> &str { "count_selected" }
///     fn description(&self) -> &str { "Count selected rows" }
///     fn allowed_permissions(&self) -> &[&'static str] { &["view"] }
///     async fn execute(
///         &self,
///         _db: &dyn AdminDbExecutor,
///         _admin: &ModelAdmin,
///         ids: &[i64],
///         _user: &str,
///     ) -> CinemaResult<ActionResult> {
///         Ok(ActionResult::success(Message::success(format!("{} selected", ids.len())), 0))
///     }
/// }
/// ```
#[async_trait]
pub trait AdminAction: Send + Sync {
    /// Returns the identifier used in requests.
    fn name(&self) -> &str;

    /// Returns the label shown to the user.
    fn description(&self) -> &str;

    /// Permissions (`view`, `add`, `change`, `delete`) the user must hold
    /// on the model to run the action.
    fn allowed_permissions(&self) -> &[&'static str];

    /// Executes the action on the selected rows. `ids` is never empty.
    async fn execute(
        &self,
        db: &dyn AdminDbExecutor,
        admin: &ModelAdmin,
        ids: &[i64],
        user: &str,
    ) -> CinemaResult<ActionResult>;
}

/// Built-in action that deletes the selected rows.
#[derive(Debug)]
pub struct DeleteSelectedAction;

#[async_trait]
impl AdminAction for DeleteSelectedAction {
    fn name(&self) -> &'static str {
        "delete_selected"
    }

    fn description(&self) -> &'static str {
        "Delete selected objects"
    }

    fn allowed_permissions(&self) -> &[&'static str] {
        &["delete"]
    }

    async fn execute(
        &self,
        db: &dyn AdminDbExecutor,
        admin: &ModelAdmin,
        ids: &[i64],
        user: &str,
    ) -> CinemaResult<ActionResult> {
        let deleted = db.delete_objects(admin, ids, user).await?;
        Ok(ActionResult::success(
            deleted_message(deleted, &admin.verbose_name, &admin.verbose_name_plural),
            deleted,
        ))
    }
}

/// Sets the `draft` flag of the selected rows.
#[derive(Debug)]
pub struct SetDraftAction {
    name: &'static str,
    description: &'static str,
    draft: bool,
}

impl SetDraftAction {
    /// The "publish" action: clears `draft`.
    pub const fn publish() -> Self {
        Self {
            name: "publish",
            description: "Publish",
            draft: false,
        }
    }

    /// The "unpublish" action: sets `draft`.
    pub const fn unpublish() -> Self {
        Self {
            name: "unpublish",
            description: "Unpublish",
            draft: true,
        }
    }
}

/// Reports how many rows an update touched.
///
/// ```
/// use cinema_admin::actions::updated_message;
///
/// assert_eq!(updated_message(1), "1 record was updated");
/// assert_eq!(updated_message(0), "0 records were updated");
/// assert_eq!(updated_message(4), "4 records were updated");
/// ```
pub fn updated_message(count: usize) -> String {
    if count == 1 {
        "1 record was updated".to_string()
    } else {
        format!("{count} records were updated")
    }
}

#[async_trait]
impl AdminAction for SetDraftAction {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn allowed_permissions(&self) -> &[&'static str] {
        &["change"]
    }

    async fn execute(
        &self,
        db: &dyn AdminDbExecutor,
        admin: &ModelAdmin,
        ids: &[i64],
        _user: &str,
    ) -> CinemaResult<ActionResult> {
        let updated = db
            .update_column(admin, ids, "draft", Value::Bool(self.draft))
            .await?;
        tracing::info!(action = self.name, updated, "set draft flag");
        Ok(ActionResult::success(
            Message::success(updated_message(updated)),
            updated,
        ))
    }
}

/// The actions available to the admin site, looked up by name.
pub struct ActionRegistry {
    actions: Vec<Box<dyn AdminAction>>,
}

impl ActionRegistry {
    /// Creates a registry holding `delete_selected`.
    pub fn new() -> Self {
        let mut registry = Self {
            actions: Vec::new(),
        };
        registry.register(Box::new(DeleteSelectedAction));
        registry
    }

    /// Registers an action, replacing any action with the same name.
    pub fn register(&mut self, action: Box<dyn AdminAction>) {
        self.actions.retain(|a| a.name() != action.name());
        self.actions.push(action);
    }

    /// Looks up an action by name.
    pub fn get(&self, name: &str) -> Option<&dyn AdminAction> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .map(|a| &**a)
    }

    /// Returns the number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if no action is registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.actions.iter().map(|a| a.name()).collect();
        f.debug_struct("ActionRegistry").field("actions", &names).finish()
    }
}
