//! IR → clap Command tree builder
//!
//! Converts a compiled [`Api`] into a clap `Command` tree, with tagged
//! operations nested under one subcommand per group.

use std::collections::{BTreeMap, HashSet};

use clap::{Arg, ArgAction, Command};

use crate::loader::Api;
use crate::naming::slug;
use crate::spec::{ApiOperation, Param};

/// Strategy for deriving subcommand names from compiled operation names.
#[derive(Debug, Clone, Copy)]
pub enum CommandNaming {
    /// Use the operation name as-is.
    ///
    /// `"list-pods"` under group `"Pods"` → command `"list-pods"`
    Default,
    /// Strip group name from command name for shorter commands.
    ///
    /// `"list-pods"` under group `"Pods"` → command `"list"`
    StripGroup,
    /// Custom naming logic.
    ///
    /// Arguments: `(operation_name, normalized_group) -> command_name`
    Custom(fn(&str, &str) -> String),
}

impl CommandNaming {
    fn apply(&self, name: &str, normalized_group: &str) -> String {
        let result = match self {
            Self::Default => return name.to_string(),
            Self::StripGroup => strip_group(name, normalized_group),
            Self::Custom(f) => f(name, normalized_group),
        };
        // Guard: empty command name would panic in clap
        if result.is_empty() {
            name.to_string()
        } else {
            result
        }
    }
}

/// Strip group name (or its singular form) from an operation name.
///
/// Tries suffix removal first, then prefix removal.
/// Falls back to the original name if stripping is not possible.
fn strip_group(op: &str, group: &str) -> String {
    if group.is_empty() {
        return op.to_string();
    }

    let singular = group.strip_suffix('s').filter(|s| !s.is_empty());

    for candidate in std::iter::once(group).chain(singular) {
        if let Some(stripped) = op.strip_suffix(&format!("-{candidate}")) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }

    for candidate in std::iter::once(group).chain(singular) {
        if let Some(stripped) = op.strip_prefix(&format!("{candidate}-")) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }

    op.to_string()
}

/// Configuration for building a CLI from a compiled API.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CliConfig {
    /// Root command name (e.g. "upguard", "myapi")
    pub name: String,
    /// Root command about text; the API's short description when empty
    pub about: String,
    /// Strategy for generating command names from operation names
    pub command_naming: CommandNaming,
}

impl CliConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            command_naming: CommandNaming::Default,
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    /// Set the command naming strategy.
    pub fn command_naming(mut self, naming: CommandNaming) -> Self {
        self.command_naming = naming;
        self
    }
}

/// Normalize a tag into a subcommand name: `"User Roles"` → `"user-roles"`.
pub fn normalize_group(name: &str) -> String {
    slug(name).replace('_', "-")
}

/// Build a clap `Command` tree from a compiled API.
///
/// Structure: `<name> [<group>] <operation> [args] [--options]`.
/// Untagged operations sit directly under the root.
pub fn build_commands(config: &CliConfig, api: &Api) -> Command {
    let about = if config.about.is_empty() {
        api.short.clone()
    } else {
        config.about.clone()
    };

    let mut root = Command::new(config.name.clone())
        .about(about)
        .subcommand_required(true)
        .arg_required_else_help(true);
    if !api.long.is_empty() {
        root = root.long_about(api.long.clone());
    }

    let mut groups: BTreeMap<String, Vec<&ApiOperation>> = BTreeMap::new();
    for op in &api.operations {
        groups
            .entry(normalize_group(&op.group))
            .or_default()
            .push(op);
    }

    for (norm_group, group_ops) in &groups {
        let commands = build_group_commands(config, group_ops);
        if norm_group.is_empty() {
            root = root.subcommands(commands);
        } else {
            let about = group_ops
                .first()
                .map(|op| format!("Manage {}", op.group))
                .unwrap_or_default();
            root = root.subcommand(
                Command::new(norm_group.clone())
                    .about(about)
                    .subcommand_required(true)
                    .arg_required_else_help(true)
                    .subcommands(commands),
            );
        }
    }

    root
}

fn command_name(config: &CliConfig, op: &ApiOperation, taken: &HashSet<String>) -> String {
    let base = config
        .command_naming
        .apply(&op.name, &normalize_group(&op.group));
    if taken.contains(&base) {
        format!("{}-{}", base, op.method.to_lowercase())
    } else {
        base
    }
}

fn build_group_commands(config: &CliConfig, ops: &[&ApiOperation]) -> Vec<Command> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut commands = Vec::new();

    for op in ops {
        let name = command_name(config, op, &taken);
        taken.insert(name.clone());

        let aliases: Vec<String> = op
            .aliases
            .iter()
            .filter(|a| !taken.contains(*a))
            .cloned()
            .collect();
        taken.extend(aliases.iter().cloned());

        commands.push(build_operation_command(op, name, aliases));
    }
    commands
}

fn build_operation_command(op: &ApiOperation, name: String, aliases: Vec<String>) -> Command {
    let mut about = op.short.clone();
    if !op.deprecated.is_empty() {
        about = format!("{about} ({})", op.deprecated).trim().to_string();
    }

    let mut cmd = Command::new(name)
        .about(about)
        .long_about(op.long.clone())
        .visible_aliases(aliases)
        .hide(op.hidden);

    // Path parameters → positional args
    for param in &op.path_params {
        cmd = cmd.arg(
            Arg::new(param.name.clone())
                .value_name(param.option_name())
                .help(param.description.clone())
                .required(true),
        );
    }

    // Query and header parameters → --flag options; first declaration of a
    // flag name wins
    for param in op.query_params.iter().chain(&op.header_params) {
        let long = param.option_name();
        if cmd
            .get_arguments()
            .any(|a| a.get_id() == param.name.as_str() || a.get_long() == Some(long.as_str()))
        {
            continue;
        }
        cmd = cmd.arg(option_arg(param));
    }

    // Request body → positional body argument
    if !op.body_media_type.is_empty() && !cmd.get_arguments().any(|a| a.get_id() == "body") {
        cmd = cmd.arg(
            Arg::new("body")
                .help(format!("Request body ({})", op.body_media_type))
                .num_args(0..)
                .trailing_var_arg(true),
        );
    }

    cmd
}

fn option_arg(param: &Param) -> Arg {
    let mut arg = Arg::new(param.name.clone())
        .long(param.option_name())
        .help(param.description.clone())
        .required(param.required && param.default.is_none());

    arg = if param.param_type == "boolean" {
        arg.action(ArgAction::SetTrue)
    } else if param.param_type.starts_with("array") {
        arg.action(ArgAction::Append)
    } else {
        arg.action(ArgAction::Set)
    };

    if let Some(default) = param.default.as_ref().filter(|_| param.param_type != "boolean") {
        let text = match default {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        arg = arg.default_value(text);
    }

    arg
}

/// Find the operation a parsed subcommand refers to.
///
/// `group_name` is the normalized group, empty for untagged operations.
/// Matches the command name, the method-suffixed name, or any alias.
pub fn find_operation<'a>(
    api: &'a Api,
    group_name: &str,
    op_name: &str,
    config: &CliConfig,
) -> Option<&'a ApiOperation> {
    api.operations.iter().find(|o| {
        let norm_group = normalize_group(&o.group);
        if norm_group != group_name {
            return false;
        }
        let base = config.command_naming.apply(&o.name, &norm_group);
        let with_method = format!("{}-{}", base, o.method.to_lowercase());
        base == op_name || with_method == op_name || o.aliases.iter().any(|a| a == op_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{BaseResolver, SwaggerLoader};
    use serde_json::json;

    fn load(doc: serde_json::Value) -> Api {
        let resolver = BaseResolver::parse("https://api.example.com").unwrap();
        SwaggerLoader::new().load(&resolver, &doc).unwrap()
    }

    fn sample_api() -> Api {
        load(json!({
            "swagger": "2.0",
            "info": { "title": "Pods API" },
            "paths": {
                "/pods": {
                    "get": { "operationId": "listPods", "tags": ["Pods"], "summary": "List pods",
                             "x-cli-aliases": ["ls"],
                             "parameters": [
                                 { "name": "limit", "in": "query", "type": "integer", "default": 10 },
                                 { "name": "label", "in": "query", "type": "array",
                                   "items": { "type": "string" } },
                                 { "name": "verbose", "in": "query", "type": "boolean" }
                             ] },
                    "post": { "operationId": "createPod", "tags": ["Pods"],
                              "parameters": [
                                  { "name": "body", "in": "body", "schema": { "type": "object" } }
                              ] }
                },
                "/pods/{podId}": {
                    "get": { "operationId": "getPod", "tags": ["Pods"],
                             "parameters": [
                                 { "name": "podId", "in": "path", "required": true, "type": "string" }
                             ] }
                },
                "/health": {
                    "get": { "operationId": "health", "x-cli-hidden": true }
                },
                "/old": {
                    "get": { "operationId": "oldThing", "deprecated": true, "summary": "Old" }
                }
            }
        }))
    }

    fn default_config() -> CliConfig {
        CliConfig::new("testcli")
    }

    fn sub<'a>(cmd: &'a Command, name: &str) -> &'a Command {
        cmd.get_subcommands()
            .find(|c| c.get_name() == name)
            .unwrap_or_else(|| panic!("missing subcommand {name}"))
    }

    // -- normalize_group --

    #[test]
    fn normalize_group_with_spaces_and_symbols() {
        assert_eq!(normalize_group("My Group"), "my-group");
        assert_eq!(normalize_group("My_Group"), "my-group");
        assert_eq!(normalize_group("PODS"), "pods");
        assert_eq!(normalize_group(""), "");
    }

    // -- strip_group --

    #[test]
    fn strip_group_suffix_plural() {
        assert_eq!(strip_group("list-pods", "pods"), "list");
    }

    #[test]
    fn strip_group_suffix_singular() {
        assert_eq!(strip_group("create-pod", "pods"), "create");
    }

    #[test]
    fn strip_group_prefix() {
        assert_eq!(strip_group("pods-list", "pods"), "list");
        assert_eq!(strip_group("pod-get", "pods"), "get");
    }

    #[test]
    fn strip_group_no_match_or_exact_returns_original() {
        assert_eq!(strip_group("get-status", "pods"), "get-status");
        assert_eq!(strip_group("pods", "pods"), "pods");
        assert_eq!(strip_group("health", ""), "health");
    }

    // -- CommandNaming --

    #[test]
    fn command_naming_custom_empty_result_falls_back() {
        let naming = CommandNaming::Custom(|_op, _group| String::new());
        assert_eq!(naming.apply("list-pods", "pods"), "list-pods");
    }

    // -- build_commands --

    #[test]
    fn build_commands_creates_group_tree() {
        let cmd = build_commands(&default_config(), &sample_api());

        assert_eq!(cmd.get_name(), "testcli");
        assert_eq!(cmd.get_about().map(|a| a.to_string()), Some("Pods API".to_string()));

        let pods = sub(&cmd, "pods");
        let names: Vec<&str> = pods.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(names, vec!["list-pods", "create-pod", "get-pod"]);

        // untagged operations stay at the root
        sub(&cmd, "health");
        sub(&cmd, "old-thing");
    }

    #[test]
    fn build_commands_aliases_hidden_and_long_help() {
        let cmd = build_commands(&default_config(), &sample_api());

        let list = sub(sub(&cmd, "pods"), "list-pods");
        let aliases: Vec<&str> = list.get_visible_aliases().collect();
        assert_eq!(aliases, vec!["listpods", "ls"]);
        assert!(list.get_long_about().is_some());

        assert!(sub(&cmd, "health").is_hide_set());

        let old = sub(&cmd, "old-thing");
        assert!(old
            .get_about()
            .unwrap()
            .to_string()
            .contains("deprecated"));
    }

    #[test]
    fn build_commands_arguments_follow_parameter_types() {
        let cmd = build_commands(&default_config(), &sample_api());
        let pods = sub(&cmd, "pods");

        let get = sub(pods, "get-pod");
        let pod_id = get.get_arguments().find(|a| a.get_id() == "podId").unwrap();
        assert!(pod_id.is_positional());
        assert!(pod_id.is_required_set());

        let list = sub(pods, "list-pods");
        let limit = list.get_arguments().find(|a| a.get_id() == "limit").unwrap();
        assert_eq!(limit.get_long(), Some("limit"));
        assert!(!limit.is_required_set());
        let label = list.get_arguments().find(|a| a.get_id() == "label").unwrap();
        assert!(matches!(label.get_action(), ArgAction::Append));
        let verbose = list.get_arguments().find(|a| a.get_id() == "verbose").unwrap();
        assert!(matches!(verbose.get_action(), ArgAction::SetTrue));

        let create = sub(pods, "create-pod");
        assert!(create.get_arguments().any(|a| a.get_id() == "body"));
    }

    #[test]
    fn build_commands_parses_arguments() {
        let cmd = build_commands(&default_config(), &sample_api());
        let matches = cmd
            .try_get_matches_from(["testcli", "pods", "ls", "--label", "a", "--label", "b"])
            .unwrap();

        let (group, group_matches) = matches.subcommand().unwrap();
        let (op_name, op_matches) = group_matches.subcommand().unwrap();
        assert_eq!(group, "pods");
        assert_eq!(op_name, "list-pods");

        let labels: Vec<&String> = op_matches.get_many::<String>("label").unwrap().collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(op_matches.get_one::<String>("limit").map(String::as_str), Some("10"));
    }

    #[test]
    fn build_commands_with_strip_group() {
        let config = default_config().command_naming(CommandNaming::StripGroup);
        let cmd = build_commands(&config, &sample_api());

        let names: Vec<&str> = sub(&cmd, "pods")
            .get_subcommands()
            .map(|c| c.get_name())
            .collect();
        assert_eq!(names, vec!["list", "create", "get"]);
    }

    #[test]
    fn build_commands_disambiguates_duplicate_names_by_method() {
        let api = load(json!({
            "swagger": "2.0",
            "paths": {
                "/pods/{id}": {
                    "put": { "operationId": "updatePod" },
                    "patch": { "operationId": "updatePod" }
                }
            }
        }));

        let cmd = build_commands(&default_config(), &api);
        sub(&cmd, "update-pod");
        let patched = sub(&cmd, "update-pod-patch");
        // the duplicate legacy alias is dropped
        assert_eq!(patched.get_visible_aliases().count(), 0);
    }

    // -- find_operation --

    #[test]
    fn find_operation_by_name_alias_and_method_suffix() {
        let api = sample_api();
        let config = default_config();

        assert_eq!(
            find_operation(&api, "pods", "create-pod", &config).unwrap().name,
            "create-pod"
        );
        assert_eq!(
            find_operation(&api, "pods", "ls", &config).unwrap().name,
            "list-pods"
        );
        assert_eq!(
            find_operation(&api, "pods", "get-pod-get", &config).unwrap().name,
            "get-pod"
        );
        assert_eq!(
            find_operation(&api, "", "health", &config).unwrap().name,
            "health"
        );
    }

    #[test]
    fn find_operation_returns_none_for_wrong_group_or_name() {
        let api = sample_api();
        let config = default_config();

        assert!(find_operation(&api, "pods", "delete-pod", &config).is_none());
        assert!(find_operation(&api, "", "list-pods", &config).is_none());
    }

    #[test]
    fn find_operation_with_strip_group() {
        let api = sample_api();
        let config = default_config().command_naming(CommandNaming::StripGroup);

        assert_eq!(
            find_operation(&api, "pods", "list", &config).unwrap().name,
            "list-pods"
        );
    }

    #[test]
    fn build_commands_skips_colliding_option_names() {
        let api = load(json!({
            "swagger": "2.0",
            "paths": {
                "/users": {
                    "get": { "operationId": "listUsers",
                             "parameters": [
                                 { "name": "limit", "in": "query", "type": "integer" },
                                 { "name": "Limit", "in": "header", "type": "string" }
                             ] }
                }
            }
        }));

        let cmd = build_commands(&CliConfig::new("t"), &api);
        let list = sub(&cmd, "list-users");
        let longs: Vec<&str> = list.get_arguments().filter_map(|a| a.get_long()).collect();
        assert_eq!(longs, vec!["limit"]);

        let matches = cmd
            .try_get_matches_from(["t", "list-users", "--limit", "1"])
            .unwrap();
        let (_, sub_matches) = matches.subcommand().unwrap();
        assert_eq!(sub_matches.get_one::<String>("limit").unwrap(), "1");
    }
}
