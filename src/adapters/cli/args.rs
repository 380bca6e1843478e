use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::OrchestratorConfig;
use crate::domain::{ExecSpec, RunSpec};

/// Wrap a token in single quotes when it embeds whitespace.
pub(crate) fn quote(token: &str) -> String {
    if token.chars().any(char::is_whitespace) {
        format!("'{token}'")
    } else {
        token.to_string()
    }
}

/// Label values may not smuggle quote characters onto the command line:
/// single quotes are stripped, then the remainder is quoted if it still
/// contains whitespace.
pub(crate) fn clean_label_value(value: &str) -> String {
    quote(&value.replace('\'', ""))
}

/// Env keys keep only `[A-Za-z0-9_.-]`; every other character is silently
/// dropped. Idempotent.
pub(crate) fn sanitize_env_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

/// Build the `docker run` argument vector for a spec.
///
/// The flag order is fixed; a flag whose computed value is empty is omitted
/// entirely, and resource limits are emitted only when positive.
pub(crate) fn run_args(spec: &RunSpec, config: &OrchestratorConfig) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string()];

    if spec.remove_on_exit {
        args.push("--rm".to_string());
    }
    if let Some(network) = &spec.network {
        push_flag(&mut args, "--network", network);
    }
    if let Some(entrypoint) = &spec.entrypoint {
        push_flag(&mut args, "--entrypoint", &quote(entrypoint));
    }
    if config.cpus > 0.0 {
        push_flag(&mut args, "--cpus", &config.cpus.to_string());
    }
    if config.memory_mb > 0 {
        push_flag(&mut args, "--memory", &format!("{}m", config.memory_mb));
    }
    if config.swap_mb > 0 {
        push_flag(&mut args, "--memory-swap", &format!("{}m", config.swap_mb));
    }

    // Provenance label: tags the container as created by this namespace.
    push_flag(
        &mut args,
        "--label",
        &format!(
            "{}-created={}",
            config.namespace,
            Utc::now().timestamp_millis()
        ),
    );

    push_flag(&mut args, "--name", &quote(&spec.name));

    if let Some(folder) = &spec.mount_folder {
        if !folder.is_empty() {
            push_flag(&mut args, "--volume", &quote(&format!("{folder}:/tmp:rw")));
        }
    }
    for bind in &spec.volumes {
        push_flag(&mut args, "--volume", &quote(bind));
    }
    for (key, value) in &spec.labels {
        if !key.is_empty() {
            push_flag(
                &mut args,
                "--label",
                &format!("{key}={}", clean_label_value(value)),
            );
        }
    }
    if let Some(workdir) = &spec.workdir {
        push_flag(&mut args, "--workdir", &quote(workdir));
    }
    if let Some(hostname) = &spec.hostname {
        push_flag(&mut args, "--hostname", &quote(hostname));
    }
    for (key, value) in &spec.env {
        let key = sanitize_env_key(key);
        if !key.is_empty() {
            push_flag(&mut args, "--env", &quote(&format!("{key}={value}")));
        }
    }

    args.push(quote(&spec.image));
    for token in &spec.command {
        if !token.is_empty() {
            args.push(quote(token));
        }
    }

    args
}

/// Build the `docker exec` argument vector (without any timeout wrapper;
/// the adapter prepends that when the spec asks for one).
pub(crate) fn exec_args(container: &str, spec: &ExecSpec) -> Vec<String> {
    let mut args = vec!["exec".to_string()];

    for (key, value) in &spec.env {
        let key = sanitize_env_key(key);
        if !key.is_empty() {
            push_flag(&mut args, "--env", &quote(&format!("{key}={value}")));
        }
    }

    args.push(container.to_string());
    for token in &spec.command {
        if !token.is_empty() {
            args.push(quote(token));
        }
    }

    args
}

/// Build the `docker ps` argument vector with filter passthrough.
pub(crate) fn list_args(filters: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec![
        "ps".to_string(),
        "--all".to_string(),
        "--no-trunc".to_string(),
        "--format".to_string(),
        "{{json .}}".to_string(),
    ];
    for (key, value) in filters {
        push_flag(&mut args, "--filter", &format!("{key}={value}"));
    }
    args
}

/// Build the `docker stats` argument vector.
pub(crate) fn stats_args(container: Option<&str>, filters: &BTreeMap<String, String>) -> Vec<String> {
    let mut args = vec![
        "stats".to_string(),
        "--no-stream".to_string(),
        "--no-trunc".to_string(),
        "--format".to_string(),
        "{{json .}}".to_string(),
    ];
    for (key, value) in filters {
        push_flag(&mut args, "--filter", &format!("{key}={value}"));
    }
    if let Some(container) = container {
        if !container.is_empty() {
            args.push(container.to_string());
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> RunSpec {
        RunSpec::new("alpine:3.20", "worker")
    }

    #[test]
    fn test_quote_only_on_whitespace() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("two words"), "'two words'");
    }

    #[test]
    fn test_clean_label_value_strips_quotes() {
        assert_eq!(clean_label_value("it's fine"), "'its fine'");
        assert_eq!(clean_label_value("plain"), "plain");
    }

    #[test]
    fn test_sanitize_env_key() {
        assert_eq!(sanitize_env_key("FOO BAR!"), "FOOBAR");
        assert_eq!(sanitize_env_key("app.port-1_x"), "app.port-1_x");
    }

    #[test]
    fn test_sanitize_env_key_idempotent() {
        let once = sanitize_env_key("F$O@O 1");
        assert_eq!(sanitize_env_key(&once), once);
    }

    #[test]
    fn test_run_args_no_limits_no_limit_flags() {
        let args = run_args(&base_spec(), &OrchestratorConfig::new());
        assert!(!args.contains(&"--cpus".to_string()));
        assert!(!args.contains(&"--memory".to_string()));
        assert!(!args.contains(&"--memory-swap".to_string()));
    }

    #[test]
    fn test_run_args_limits_emitted_in_mb() {
        let config = OrchestratorConfig::new()
            .with_cpus(1.5)
            .with_memory_mb(512)
            .with_swap_mb(1024);
        let args = run_args(&base_spec(), &config);

        let cpus_at = args.iter().position(|a| a == "--cpus").unwrap();
        assert_eq!(args[cpus_at + 1], "1.5");
        let mem_at = args.iter().position(|a| a == "--memory").unwrap();
        assert_eq!(args[mem_at + 1], "512m");
        let swap_at = args.iter().position(|a| a == "--memory-swap").unwrap();
        assert_eq!(args[swap_at + 1], "1024m");
    }

    #[test]
    fn test_run_args_never_emits_empty_token() {
        let spec = base_spec()
            .with_network("")
            .with_entrypoint("")
            .with_workdir("")
            .with_hostname("");
        let args = run_args(&spec, &OrchestratorConfig::new());
        assert!(args.iter().all(|a| !a.is_empty()));
        assert!(!args.contains(&"--network".to_string()));
        assert!(!args.contains(&"--entrypoint".to_string()));
        assert!(!args.contains(&"--workdir".to_string()));
        assert!(!args.contains(&"--hostname".to_string()));
    }

    #[test]
    fn test_run_args_provenance_label() {
        let config = OrchestratorConfig::new().with_namespace("runtimes");
        let args = run_args(&base_spec(), &config);
        let labels: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "--label")
            .map(|(i, _)| &args[i + 1])
            .collect();
        assert_eq!(labels.len(), 1);
        let label = labels[0];
        let (key, value) = label.split_once('=').unwrap();
        assert_eq!(key, "runtimes-created");
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_run_args_flag_order() {
        let config = OrchestratorConfig::new().with_cpus(2.0).with_memory_mb(256);
        let spec = base_spec()
            .with_remove_on_exit(true)
            .with_network("net0")
            .with_entrypoint("sh")
            .with_mount_folder("/data")
            .with_volume("/a:/b")
            .with_label("env", "prod")
            .with_workdir("/srv")
            .with_hostname("box")
            .with_env("PORT", "80")
            .with_command(vec!["echo".to_string(), "hi".to_string()]);
        let args = run_args(&spec, &config);

        let position = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert_eq!(args[0], "run");
        assert_eq!(args[1], "-d");
        assert_eq!(args[2], "--rm");
        assert!(position("--network") < position("--entrypoint"));
        assert!(position("--entrypoint") < position("--cpus"));
        assert!(position("--cpus") < position("--memory"));
        assert!(position("--memory") < position("--label"));
        assert!(position("--label") < position("--name"));
        assert!(position("--name") < position("--volume"));
        assert!(position("--workdir") < position("--hostname"));
        assert!(position("--hostname") < position("--env"));
        let image_at = args.iter().position(|a| a == "alpine:3.20").unwrap();
        assert!(position("--env") < image_at);
        assert_eq!(args[image_at + 1], "echo");
        assert_eq!(args[image_at + 2], "hi");
    }

    #[test]
    fn test_run_args_mount_folder_binds_tmp() {
        let spec = base_spec().with_mount_folder("/data/run");
        let args = run_args(&spec, &OrchestratorConfig::new());
        assert!(args.contains(&"/data/run:/tmp:rw".to_string()));
    }

    #[test]
    fn test_run_args_quotes_whitespace_tokens() {
        let spec = base_spec().with_command(vec!["echo".to_string(), "hello world".to_string()]);
        let args = run_args(&spec, &OrchestratorConfig::new());
        assert!(args.contains(&"'hello world'".to_string()));
    }

    #[test]
    fn test_exec_args_sanitizes_env() {
        let spec = ExecSpec::new(vec!["ls".to_string()]).with_env("BAD KEY!", "v");
        let args = exec_args("worker", &spec);
        assert!(args.contains(&"BADKEY=v".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("ls"));
    }

    #[test]
    fn test_list_args_filter_passthrough() {
        let mut filters = BTreeMap::new();
        filters.insert("label".to_string(), "utopia-created".to_string());
        let args = list_args(&filters);
        let at = args.iter().position(|a| a == "--filter").unwrap();
        assert_eq!(args[at + 1], "label=utopia-created");
    }

    #[test]
    fn test_stats_args_optional_container() {
        let filters = BTreeMap::new();
        let all = stats_args(None, &filters);
        assert!(!all.contains(&"worker".to_string()));
        let one = stats_args(Some("worker"), &filters);
        assert_eq!(one.last().map(String::as_str), Some("worker"));
    }
}
