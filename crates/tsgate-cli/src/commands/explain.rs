//! Explain command - provides detailed explanation of a rule

use clap::Args;
use colored::Colorize;
use std::env;
use tsgate_core::analysis::AnalysisEngine;
use tsgate_core::config::load_config_or_default_with_warnings;
use tsgate_core::rules::{Rule, RuleRegistry, Severity};

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(
        value_name = "RULE",
        help = "Rule ID or name to explain (e.g., \"TT001\", \"ban-eval-calls\")"
    )]
    pub rule_id: String,
}

impl ExplainArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let cwd = env::current_dir()?;
        let config = load_config_or_default_with_warnings(&cwd).config;
        let engine = AnalysisEngine::with_config(&config);
        let registry = engine.registry();

        match find_rule(registry, &self.rule_id) {
            Some(rule) => {
                print!("{}", describe(registry, rule));
                Ok(())
            }
            None => {
                eprintln!(
                    "{} Rule '{}' not found",
                    "error:".red().bold(),
                    self.rule_id
                );
                eprintln!();
                eprintln!("Available rules:");
                for rule in registry.rules() {
                    let meta = rule.metadata();
                    eprintln!("  {} ({})", meta.id, meta.name);
                }

                std::process::exit(1);
            }
        }
    }
}

fn find_rule<'a>(registry: &'a RuleRegistry, id_or_name: &str) -> Option<&'a dyn Rule> {
    registry
        .get_rule(id_or_name)
        .or_else(|| registry.get_rule_by_name(id_or_name))
}

fn describe(registry: &RuleRegistry, rule: &dyn Rule) -> String {
    let metadata = rule.metadata();
    let mut lines = vec![
        String::new(),
        format!("Rule {}", metadata.id).bold().to_string(),
        String::new(),
        format!("  {}: {}", "Name".cyan(), metadata.name),
        format!("  {}: {}", "Description".cyan(), metadata.description),
        format!(
            "  {}: {}",
            "Severity".cyan(),
            format_severity(&registry.severity_for(rule))
        ),
    ];

    if let Some(url) = metadata.docs_url {
        lines.push(format!("  {}: {}", "Documentation".cyan(), url));
    }

    if let Some(examples) = metadata.examples {
        lines.push(String::new());
        lines.push(format!("  {}:", "Examples".cyan()));
        lines.extend(examples.lines().map(|line| format!("    {}", line)));
    }

    lines.push(String::new());
    let status = if registry.is_rule_enabled(&metadata.id) {
        "enabled".green()
    } else {
        "disabled".red()
    };
    lines.push(format!("  {}: {}", "Status".cyan(), status));
    lines.push(String::new());

    lines.join("\n")
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Error => "error".red().to_string(),
        Severity::Warning => "warning".yellow().to_string(),
        Severity::Info => "info".blue().to_string(),
        Severity::Hint => "hint".cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsgate_core::config::{Config, RulesConfig};

    #[test]
    fn explain_finds_rule_by_id_and_name() {
        let engine = AnalysisEngine::with_config(&Config::default());
        let registry = engine.registry();

        let by_id = find_rule(registry, "TT001").expect("TT001 should exist");
        let by_name = find_rule(registry, "ban-eval-calls").expect("ban-eval-calls should exist");

        assert_eq!(by_id.metadata(), by_name.metadata());
        assert!(find_rule(registry, "TT999").is_none());
    }

    #[test]
    fn description_lists_examples_and_status() {
        colored::control::set_override(false);
        let engine = AnalysisEngine::with_config(&Config::default());
        let registry = engine.registry();
        let rule = find_rule(registry, "ban-eval-calls").unwrap();

        let text = describe(registry, rule);

        assert!(text.contains("Rule TT001"));
        assert!(text.contains("Name: ban-eval-calls"));
        assert!(text.contains("eval(policy.createScript(code));"));
        assert!(text.contains("Status: enabled"));
    }

    #[test]
    fn description_reflects_configuration() {
        colored::control::set_override(false);
        let config = Config {
            rules: RulesConfig {
                disabled: vec!["ban-eval-calls".to_string()],
                ..RulesConfig::default()
            },
            ..Config::default()
        };
        let engine = AnalysisEngine::with_config(&config);
        let registry = engine.registry();
        let rule = find_rule(registry, "TT001").unwrap();

        let text = describe(registry, rule);

        assert!(text.contains("Status: disabled"));
    }
}
