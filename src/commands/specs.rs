//! `list-specs` and `describe-spec`

use crate::Context;
use crate::commands::load_repository;
use crate::ui;
use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use speckit::{BuildPlan, Spec, SpecRepository};

pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let repository = load_repository(ctx)?;
    list_repository(&repository, json)
}

pub fn describe(ctx: &Context, name: &str, json: bool) -> Result<()> {
    let repository = load_repository(ctx)?;
    describe_in(&repository, name, json)
}

fn list_repository(repository: &SpecRepository, json: bool) -> Result<()> {
    if json {
        let specs: Vec<&Spec> = repository.iter().collect();
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    ui::info(&format!(
        "There are [{}] specs available currently",
        repository.len()
    ));

    for spec in repository.iter() {
        print_spec(spec);
    }
    Ok(())
}

/// Show the plan for `name`; an unknown spec is reported but is not an error
fn describe_in(repository: &SpecRepository, name: &str, json: bool) -> Result<()> {
    if !repository.contains(name) {
        ui::error_box(
            "Unable to find Spec!",
            &format!("I was unable to find a spec named [{name}]."),
        );
        return Ok(());
    }

    let plan = repository
        .resolver()
        .plan(name)
        .with_context(|| format!("Could not resolve spec [{name}]"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    ui::info(&format!("Showing spec plan for spec: [{name}]"));
    print_plan(&plan);
    Ok(())
}

fn print_spec(spec: &Spec) {
    ui::header(&format!("[{}]", spec.name));
    ui::kv("Version", &spec.version);
    ui::kv("Root", &spec.spec_root.display().to_string());
    ui::kv("File", &spec.spec_file.display().to_string());

    let requires: Vec<String> = spec.requirements().map(String::from).collect();
    ui::kv("Requires", &requires.join(" "));
    ui::kv("Apt Packages", &spec.packages.apt_get.join(" "));
    ui::kv("Configs Root", &spec.configs.debian_root);
    ui::kv("Content Source", &spec.content.source);
    ui::kv("Content Root", &spec.content.debian_root);
    ui::list("Pre-configure commands", &spec.commands.pre);
    ui::list("Post-configure commands", &spec.commands.post);
}

fn print_plan(plan: &BuildPlan) {
    ui::header(&format!("[{}]", plan.name));

    ui::section(&requires_heading(plan));
    for line in plan.requires.render() {
        println!("  {}", line.cyan());
    }

    ui::section("Build");
    ui::list("pre-configure commands", &plan.pre_commands);
    ui::list("apt-get commands", &plan.apt_commands);
    ui::list("File transfers", &transfer_lines(plan));
    ui::list("post-configure commands", &plan.post_commands);
}

fn requires_heading(plan: &BuildPlan) -> String {
    match plan.requires.descendants() {
        0 => "Requires (none)".to_string(),
        1 => "Requires (1 spec)".to_string(),
        n => format!("Requires ({n} specs)"),
    }
}

fn transfer_lines(plan: &BuildPlan) -> Vec<String> {
    plan.file_transfers
        .iter()
        .map(|t| {
            let mut line = format!("{} → {}", t.source.display(), t.destination.display());
            if t.interpolate {
                line.push_str(" (interpolated)");
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, SpecRepository) {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "base/base.spec",
            "NAME = \"base\"\n[PACKAGES]\napt_get = [\"curl\"]\n[COMMANDS]\npre = [\"echo base-pre\"]\n",
        );
        write(
            temp.path(),
            "web/web.spec",
            "NAME = \"web\"\nREQUIRES = [\"base\"]\n[CONFIGS]\ndebian_root = \"/etc/nginx\"\n",
        );
        write(temp.path(), "web/configs/nginx.conf", "user ${var.class};\n");

        let repository = SpecRepository::load(&[temp.path()]).unwrap();
        (temp, repository)
    }

    #[test]
    fn test_list_and_describe_render() {
        let (_temp, repository) = fixture();
        list_repository(&repository, false).unwrap();
        list_repository(&repository, true).unwrap();
        describe_in(&repository, "web", false).unwrap();
        describe_in(&repository, "web", true).unwrap();
    }

    #[test]
    fn test_describe_unknown_is_not_an_error() {
        let (_temp, repository) = fixture();
        assert!(describe_in(&repository, "nope", false).is_ok());
    }

    #[test]
    fn test_requires_heading_counts_every_required_spec() {
        let (temp, _) = fixture();
        write(
            temp.path(),
            "app/app.spec",
            "NAME = \"app\"\nREQUIRES = [\"web\"]\n",
        );
        let repository = SpecRepository::load(&[temp.path()]).unwrap();
        let resolver = repository.resolver();

        let heading = |name: &str| requires_heading(&resolver.plan(name).unwrap());
        assert_eq!(heading("base"), "Requires (none)");
        assert_eq!(heading("web"), "Requires (1 spec)");
        assert_eq!(heading("app"), "Requires (2 specs)");
    }

    #[test]
    fn test_plan_json_shape() {
        let (_temp, repository) = fixture();
        let plan = repository.resolver().plan("web").unwrap();
        let value = serde_json::to_value(&plan).unwrap();

        assert_eq!(value["name"], "web");
        assert_eq!(value["pre_commands"][0], "echo base-pre");
        assert_eq!(value["requires"]["children"][0]["name"], "base");
        assert_eq!(
            value["file_transfers"][0]["destination"],
            "/etc/nginx/nginx.conf"
        );
    }

    #[test]
    fn test_transfer_lines_mark_interpolation() {
        let (_temp, repository) = fixture();
        let plan = repository.resolver().plan("web").unwrap();
        let lines = transfer_lines(&plan);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("/etc/nginx/nginx.conf (interpolated)"));
    }
}
