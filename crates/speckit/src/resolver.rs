//! Dependency-ordered aggregation over a [`SpecRepository`]
//!
//! Packages and commands of required specs come *before* the dependent spec's
//! own items; file transfers of required specs come *after*. Unknown names
//! contribute nothing, and a set skip flag silences the whole subtree for that
//! list.

use crate::dedup::dedup_first;
use crate::error::ResolveError;
use crate::repository::SpecRepository;
use crate::tree::RequireNode;
use crate::types::{FileTransfer, Spec};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Privilege prefix used by the generated apt-get commands
pub const DEFAULT_PRIVILEGE: &str = "sudo";

const APT_UPDATE: &str = "apt-get update -o Dpkg::Options::=\"--force-confdef\" -o Dpkg::Options::=\"--force-confold\"";
const APT_INSTALL: &str = "apt-get install -y -f --assume-yes --allow-unauthenticated";

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Which command list a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Pre,
    Post,
}

/// Everything a target spec would do, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub name: String,
    pub requires: RequireNode,
    pub pre_commands: Vec<String>,
    pub apt_commands: Vec<String>,
    pub file_transfers: Vec<FileTransfer>,
    pub post_commands: Vec<String>,
}

/// Read-only view answering aggregation questions about one repository
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    repository: &'a SpecRepository,
}

impl SpecRepository {
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }
}

impl<'a> Resolver<'a> {
    pub fn new(repository: &'a SpecRepository) -> Self {
        Self { repository }
    }

    /// apt packages for `name` and everything it requires
    pub fn apt_packages(&self, name: &str) -> Result<Vec<String>> {
        self.aggregate(name, select_packages, &mut Vec::new())
    }

    pub fn pre_commands(&self, name: &str) -> Result<Vec<String>> {
        self.aggregate(name, select_pre, &mut Vec::new())
    }

    pub fn post_commands(&self, name: &str) -> Result<Vec<String>> {
        self.aggregate(name, select_post, &mut Vec::new())
    }

    /// The refresh and install commands, or nothing when no packages resolve
    pub fn apt_commands(&self, name: &str) -> Result<Vec<String>> {
        Ok(apt_get_commands(&self.apt_packages(name)?, DEFAULT_PRIVILEGE))
    }

    /// Files to install for `name`: its own first, then those of each requirement
    pub fn file_transfers(&self, name: &str) -> Result<Vec<FileTransfer>> {
        self.collect_transfers(name, &mut Vec::new())
    }

    pub fn require_tree(&self, name: &str) -> Result<RequireNode> {
        self.build_tree(name, &mut Vec::new())
    }

    /// Commands whose output should be forwarded after they succeed.
    ///
    /// A command is tailed when any contributing spec sets the matching
    /// `tail_pre`/`tail_post` flag.
    pub fn tailed_commands(&self, name: &str, phase: CommandPhase) -> Result<HashSet<String>> {
        let mut tailed = HashSet::new();
        self.collect_tailed(name, phase, &mut Vec::new(), &mut tailed)?;
        Ok(tailed)
    }

    pub fn plan(&self, name: &str) -> Result<BuildPlan> {
        Ok(BuildPlan {
            name: name.to_string(),
            requires: self.require_tree(name)?,
            pre_commands: self.pre_commands(name)?,
            apt_commands: self.apt_commands(name)?,
            file_transfers: self.file_transfers(name)?,
            post_commands: self.post_commands(name)?,
        })
    }

    // ------------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------------

    fn aggregate(
        &self,
        name: &str,
        select: Selector,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let Some(spec) = self.repository.get(name) else {
            return Ok(Vec::new());
        };
        let Some(own) = select(spec) else {
            return Ok(Vec::new());
        };

        enter(stack, name)?;

        let mut items: Vec<String> = own
            .iter()
            .filter(|item| !item.trim().is_empty())
            .cloned()
            .collect();

        // Each requirement is prepended in turn
        for requirement in spec.requirements() {
            let mut required = self.aggregate(requirement, select, stack)?;
            required.append(&mut items);
            items = required;
        }

        stack.pop();
        Ok(dedup_first(items))
    }

    fn collect_transfers(&self, name: &str, stack: &mut Vec<String>) -> Result<Vec<FileTransfer>> {
        let Some(spec) = self.repository.get(name) else {
            return Ok(Vec::new());
        };

        enter(stack, name)?;

        let mut files = Vec::new();

        if !spec.configs.debian_root.is_empty() {
            files.extend(
                map_tree(
                    &spec.configs_dir(),
                    Path::new(&spec.configs.debian_root),
                    !spec.configs.skip_interpolate,
                )
                .map(|f| f.with_permissions(spec.configs.owner.clone(), spec.configs.mode.clone())),
            );
        }

        if spec.content.is_spec_local() && !spec.content.debian_root.is_empty() {
            files.extend(
                map_tree(
                    &spec.content_dir(),
                    Path::new(&spec.content.debian_root),
                    false,
                )
                .map(|f| f.with_permissions(spec.content.owner.clone(), spec.content.mode.clone())),
            );
        }

        for requirement in spec.requirements() {
            files.extend(self.collect_transfers(requirement, stack)?);
        }

        stack.pop();
        Ok(files)
    }

    fn build_tree(&self, name: &str, stack: &mut Vec<String>) -> Result<RequireNode> {
        let mut node = RequireNode::new(name);
        let Some(spec) = self.repository.get(name) else {
            return Ok(node);
        };

        enter(stack, name)?;
        for requirement in spec.requirements() {
            node.children.push(self.build_tree(requirement, stack)?);
        }
        stack.pop();

        Ok(node)
    }

    fn collect_tailed(
        &self,
        name: &str,
        phase: CommandPhase,
        stack: &mut Vec<String>,
        tailed: &mut HashSet<String>,
    ) -> Result<()> {
        let selector: Selector = match phase {
            CommandPhase::Pre => select_pre,
            CommandPhase::Post => select_post,
        };
        let Some(spec) = self.repository.get(name) else {
            return Ok(());
        };
        let Some(own) = selector(spec) else {
            return Ok(());
        };

        enter(stack, name)?;

        let tail = match phase {
            CommandPhase::Pre => spec.commands.tail_pre,
            CommandPhase::Post => spec.commands.tail_post,
        };
        if tail {
            tailed.extend(own.iter().cloned());
        }

        for requirement in spec.requirements() {
            self.collect_tailed(requirement, phase, stack, tailed)?;
        }

        stack.pop();
        Ok(())
    }
}

/// Build the apt-get refresh and install commands for `packages`.
///
/// `privilege` prefixes both commands (e.g. "sudo"); pass "" to run them as is.
pub fn apt_get_commands(packages: &[String], privilege: &str) -> Vec<String> {
    if packages.is_empty() {
        return Vec::new();
    }

    let prefix = if privilege.is_empty() {
        String::new()
    } else {
        format!("{privilege} ")
    };

    vec![
        format!("{prefix}{APT_UPDATE}"),
        format!("{prefix}{APT_INSTALL} {}", packages.join(" ")),
    ]
}

type Selector = fn(&Spec) -> Option<&[String]>;

fn select_packages(spec: &Spec) -> Option<&[String]> {
    (!spec.packages.skip_packages).then_some(spec.packages.apt_get.as_slice())
}

fn select_pre(spec: &Spec) -> Option<&[String]> {
    (!spec.commands.skip_pre).then_some(spec.commands.pre.as_slice())
}

fn select_post(spec: &Spec) -> Option<&[String]> {
    (!spec.commands.skip_post).then_some(spec.commands.post.as_slice())
}

/// Push `name` onto the walk path, failing if it is already on it
fn enter(stack: &mut Vec<String>, name: &str) -> Result<()> {
    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut cycle = stack[start..].to_vec();
        cycle.push(name.to_string());
        return Err(ResolveError::CyclicDependency { cycle });
    }
    stack.push(name.to_string());
    Ok(())
}

/// Map every file below `source_root` onto `destination_root`, sorted by path
fn map_tree<'p>(
    source_root: &'p Path,
    destination_root: &'p Path,
    interpolate: bool,
) -> impl Iterator<Item = FileTransfer> + 'p {
    WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| {
            let relative = entry.path().strip_prefix(source_root).ok()?;
            Some(FileTransfer::new(
                entry.path().to_path_buf(),
                destination_root.join(relative),
                interpolate,
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn spec(name: &str, requires: &[&str]) -> Spec {
        let mut spec = Spec::new(name);
        spec.requires = requires.iter().map(|r| r.to_string()).collect();
        spec
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn base_and_web() -> SpecRepository {
        let mut base = spec("base", &[]);
        base.packages.apt_get = strings(&["curl"]);
        base.commands.pre = strings(&["echo base-pre"]);

        let mut web = spec("web", &["base"]);
        web.packages.apt_get = strings(&["nginx"]);
        web.commands.pre = strings(&["echo web-pre"]);

        [base, web].into_iter().collect()
    }

    #[test]
    fn test_base_and_web_example() {
        let repo = base_and_web();
        let resolver = repo.resolver();

        assert_eq!(resolver.apt_packages("web").unwrap(), strings(&["curl", "nginx"]));
        assert_eq!(
            resolver.pre_commands("web").unwrap(),
            strings(&["echo base-pre", "echo web-pre"])
        );
    }

    #[test]
    fn test_unknown_name_is_empty() {
        let repo = base_and_web();
        let resolver = repo.resolver();

        assert!(resolver.apt_packages("nonexistent").unwrap().is_empty());
        assert!(resolver.pre_commands("nonexistent").unwrap().is_empty());
        assert!(resolver.file_transfers("nonexistent").unwrap().is_empty());
        assert!(resolver.require_tree("nonexistent").unwrap().is_leaf());
    }

    #[test]
    fn test_skip_short_circuits_subtree() {
        let mut repo = base_and_web();
        let mut web = repo.get("web").unwrap().clone();
        web.packages.skip_packages = true;
        repo.insert(web);

        let resolver = repo.resolver();
        assert!(resolver.apt_packages("web").unwrap().is_empty());
        // Other lists are unaffected
        assert_eq!(resolver.pre_commands("web").unwrap().len(), 2);
    }

    #[test]
    fn test_skip_in_requirement_only_drops_that_subtree() {
        let mut core = spec("core", &[]);
        core.commands.post = strings(&["core-post"]);
        let mut base = spec("base", &["core"]);
        base.commands.post = strings(&["base-post"]);
        base.commands.skip_post = true;
        let mut app = spec("app", &["base"]);
        app.commands.post = strings(&["app-post"]);

        let repo: SpecRepository = [core, base, app].into_iter().collect();
        assert_eq!(repo.resolver().post_commands("app").unwrap(), strings(&["app-post"]));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut base = spec("base", &[]);
        base.commands.pre = strings(&["update", "base"]);
        let mut web = spec("web", &["base"]);
        web.commands.pre = strings(&["update", "web", "web"]);

        let repo: SpecRepository = [base, web].into_iter().collect();
        let resolver = repo.resolver();
        let first = resolver.pre_commands("web").unwrap();
        assert_eq!(first, strings(&["update", "base", "web"]));
        assert_eq!(first, resolver.pre_commands("web").unwrap());
    }

    #[test]
    fn test_multiple_requirements_are_prepended_in_turn() {
        let mut b = spec("b", &[]);
        b.commands.pre = strings(&["b"]);
        let mut c = spec("c", &[]);
        c.commands.pre = strings(&["c"]);
        let mut a = spec("a", &["b", "", "\"\"", "c"]);
        a.commands.pre = strings(&["a"]);

        let repo: SpecRepository = [a, b, c].into_iter().collect();
        assert_eq!(repo.resolver().pre_commands("a").unwrap(), strings(&["c", "b", "a"]));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut d = spec("d", &[]);
        d.packages.apt_get = strings(&["libd"]);
        let b = spec("b", &["d"]);
        let c = spec("c", &["d"]);
        let a = spec("a", &["b", "c"]);

        let repo: SpecRepository = [a, b, c, d].into_iter().collect();
        assert_eq!(repo.resolver().apt_packages("a").unwrap(), strings(&["libd"]));
    }

    #[test]
    fn test_cycle_is_reported() {
        let a = spec("a", &["b"]);
        let b = spec("b", &["a"]);
        let repo: SpecRepository = [a, b].into_iter().collect();
        let resolver = repo.resolver();

        let err = resolver.pre_commands("a").unwrap_err();
        assert_eq!(
            err,
            ResolveError::CyclicDependency {
                cycle: strings(&["a", "b", "a"])
            }
        );
        assert!(resolver.file_transfers("b").is_err());
        assert!(resolver.require_tree("a").is_err());
    }

    #[test]
    fn test_self_requirement_is_a_cycle() {
        let repo: SpecRepository = [spec("loop", &["loop"])].into_iter().collect();
        assert!(repo.resolver().apt_packages("loop").is_err());
    }

    #[test]
    fn test_apt_commands() {
        let repo = base_and_web();
        let commands = repo.resolver().apt_commands("web").unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            "sudo apt-get update -o Dpkg::Options::=\"--force-confdef\" -o Dpkg::Options::=\"--force-confold\""
        );
        assert_eq!(
            commands[1],
            "sudo apt-get install -y -f --assume-yes --allow-unauthenticated curl nginx"
        );

        assert!(apt_get_commands(&[], "sudo").is_empty());
        assert!(apt_get_commands(&strings(&["vim"]), "")[1].starts_with("apt-get install"));
    }

    #[test]
    fn test_require_tree() {
        let repo: SpecRepository = [
            spec("core", &[]),
            spec("base", &["core"]),
            spec("web", &["base", "\"\"", "tls"]),
        ]
        .into_iter()
        .collect();

        let tree = repo.resolver().require_tree("web").unwrap();
        assert_eq!(tree.name, "web");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[0].name, "core");
        // Unknown requirements still appear, just without children
        assert_eq!(tree.children[1].name, "tls");
        assert!(tree.children[1].is_leaf());
    }

    fn spec_on_disk(temp: &TempDir, name: &str, requires: &[&str], files: &[&str]) -> Spec {
        let root = temp.path().join(name);
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file).unwrap();
        }

        let mut spec = spec(name, requires);
        spec.spec_root = root.clone();
        spec.spec_file = root.join(format!("{name}.spec"));
        spec
    }

    #[test]
    fn test_file_transfers_own_first_then_requirements() {
        let temp = TempDir::new().unwrap();

        let mut base = spec_on_disk(&temp, "base", &[], &["configs/motd"]);
        base.configs.debian_root = "/etc".into();

        let mut web = spec_on_disk(
            &temp,
            "web",
            &["base"],
            &["configs/nginx/nginx.conf", "configs/nginx/a.conf", "content/index.html"],
        );
        web.configs.debian_root = "/etc".into();
        web.configs.owner = Some("root:root".into());
        web.content.source = "spec".into();
        web.content.debian_root = "/var/www".into();

        let repo: SpecRepository = [base, web].into_iter().collect();
        let transfers = repo.resolver().file_transfers("web").unwrap();

        let destinations: Vec<PathBuf> = transfers.iter().map(|t| t.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                PathBuf::from("/etc/nginx/a.conf"),
                PathBuf::from("/etc/nginx/nginx.conf"),
                PathBuf::from("/var/www/index.html"),
                PathBuf::from("/etc/motd"),
            ]
        );

        assert!(transfers[0].interpolate);
        assert_eq!(transfers[0].destination_folder, PathBuf::from("/etc/nginx"));
        assert_eq!(transfers[0].owner.as_deref(), Some("root:root"));
        assert!(!transfers[2].interpolate);
        assert!(transfers[2].owner.is_none());
        assert!(transfers[3].source.ends_with("base/configs/motd"));
    }

    #[test]
    fn test_file_transfers_ignore_skip_flags_but_honor_roots() {
        let temp = TempDir::new().unwrap();

        let mut app = spec_on_disk(&temp, "app", &[], &["configs/app.ini", "content/blob"]);
        app.packages.skip_packages = true;
        app.commands.skip_pre = true;
        app.configs.debian_root = "/opt/app".into();
        app.configs.skip_interpolate = true;
        // Content from elsewhere is never transferred
        app.content.source = "remote".into();
        app.content.debian_root = "/srv".into();

        let repo: SpecRepository = [app].into_iter().collect();
        let transfers = repo.resolver().file_transfers("app").unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].destination, PathBuf::from("/opt/app/app.ini"));
        assert!(!transfers[0].interpolate);
    }

    #[test]
    fn test_file_transfers_without_roots() {
        let temp = TempDir::new().unwrap();
        let app = spec_on_disk(&temp, "app", &[], &["configs/app.ini"]);
        let repo: SpecRepository = [app].into_iter().collect();
        assert!(repo.resolver().file_transfers("app").unwrap().is_empty());
    }

    #[test]
    fn test_tailed_commands() {
        let mut base = spec("base", &[]);
        base.commands.post = strings(&["base-post"]);
        base.commands.tail_post = true;
        let mut web = spec("web", &["base"]);
        web.commands.post = strings(&["web-post"]);
        web.commands.pre = strings(&["web-pre"]);

        let repo: SpecRepository = [base, web].into_iter().collect();
        let resolver = repo.resolver();

        let post = resolver.tailed_commands("web", CommandPhase::Post).unwrap();
        assert!(post.contains("base-post"));
        assert!(!post.contains("web-post"));
        assert!(resolver.tailed_commands("web", CommandPhase::Pre).unwrap().is_empty());
    }

    #[test]
    fn test_plan() {
        let repo = base_and_web();
        let plan = repo.resolver().plan("web").unwrap();
        assert_eq!(plan.name, "web");
        assert_eq!(plan.requires.children.len(), 1);
        assert_eq!(plan.pre_commands.len(), 2);
        assert_eq!(plan.apt_commands.len(), 2);
        assert!(plan.file_transfers.is_empty());
        assert!(plan.post_commands.is_empty());
    }
}
