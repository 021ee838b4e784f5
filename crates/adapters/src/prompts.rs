// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the four prompt strings handed to the assistant subprocess,
//! ported in meaning from `original_source/orchestrator/prompts.py`.
//!
//! The skills-discovery helper is gated by the `SkillsEnabled` config flag
//! and shared across all four prompts rather than duplicated per builder.

use crate::forge::ReviewThread;
use std::path::{Path, PathBuf};

/// Builds prompts for a fixed target repo, gated by `skills_enabled`.
pub struct PromptBuilder {
    target_repo_path: PathBuf,
    skills_enabled: bool,
}

impl PromptBuilder {
    pub fn new(target_repo_path: impl Into<PathBuf>, skills_enabled: bool) -> Self {
        Self { target_repo_path: target_repo_path.into(), skills_enabled }
    }

    fn skills_block(&self) -> String {
        if !self.skills_enabled {
            return String::new();
        }
        let skills = discover_installed_skills(&self.target_repo_path);
        if skills.is_empty() {
            return String::new();
        }
        let skill_list = skills.join(", ");
        format!(
            "\nSkills: You have access to Claude Code skills via the Skill tool. Installed skills: {skill_list}.\n\
             If the issue plan or review comments mention using a specific skill (e.g. \"use the frontend-design skill\"),\n\
             invoke it with the Skill tool. You can also use relevant skills proactively when the task\n\
             matches their domain."
        )
    }

    pub fn implement(&self, issue_number: i64) -> String {
        let skills = self.skills_block();
        format!(
            "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
             Your task: Implement the feature or fix described in issue #{issue_number}.\n\
             {skills}\n\
             Step 1 — Read the implementation plan:\n\
             Run `gh issue view {issue_number}` to read the full issue description.\n\
             The issue body contains a DETAILED IMPLEMENTATION PLAN. This is your complete spec.\n\
             Read it carefully — it describes exactly what to build, which files to modify,\n\
             what approach to take, and any edge cases to handle.\n\n\
             Step 2 — Implement:\n\
             Follow the plan in the issue body step by step.\n\
             Follow AGENT.md coding standards for all code you write.\n\n\
             Step 3 — Test:\n\
             Run the project's test suite to verify your changes work.\n\
             If tests fail, fix the issues and re-run tests until they pass.\n\n\
             Step 4 — Commit and push:\n\
             Stage your changes and commit with a descriptive message referencing #{issue_number}.\n\
             Push the branch: `git push -u origin fix/issue-{issue_number}`\n\n\
             Step 5 — Create PR:\n\
             Create a PR: `gh pr create --title \"Fix #{issue_number}: <concise title>\" --body \"Closes #{issue_number}\\n\\n<summary of what was implemented based on the plan>\"`\n\n\
             Important:\n\
             - The issue body IS the plan. Follow it precisely.\n\
             - Do NOT modify files unrelated to what the plan specifies.\n\
             - If the plan is unclear or something seems wrong, create the PR as a draft and note your questions in the PR body.\n\
             - Always run tests before creating the PR."
        )
    }

    pub fn fix_review(&self, pr_number: i64, unresolved_threads: Option<&[ReviewThread]>) -> String {
        let skills = self.skills_block();
        match unresolved_threads {
            Some(threads) => {
                let threads_block = format_unresolved_threads(threads);
                format!(
                    "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
                     Your task: Fix all UNRESOLVED review comments on PR #{pr_number}.\n\
                     {skills}\n\
                     There are {count} unresolved review thread(s). Here are the details:\n\n\
                     {threads_block}\n\
                     Steps:\n\
                     1. Read and understand each unresolved thread above.\n\
                     2. For each thread, open the referenced file and implement the requested fix.\n\
                     3. Run the project's test suite to verify your changes.\n\
                     4. If tests fail, fix the issues and re-run tests.\n\
                     5. Commit all fixes with message: \"fix: address review comments on PR #{pr_number}\"\n\
                     6. Push to the existing branch.\n\n\
                     Important:\n\
                     - Fix EVERY unresolved thread listed above — do not skip any.\n\
                     - Do NOT modify files unrelated to the review comments.\n\
                     - If a comment is unclear, add a reply comment asking for clarification using `gh pr comment`.",
                    count = threads.len(),
                )
            }
            None => format!(
                "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
                 Your task: Fix all UNRESOLVED review comments on PR #{pr_number}.\n\
                 {skills}\n\
                 Steps:\n\
                 1. Run `gh pr view {pr_number} --comments` to see the PR description and all comments.\n\
                 2. Run `gh api repos/{{owner}}/{{repo}}/pulls/{pr_number}/comments` to get all inline review comment details.\n\
                 3. For each review comment, understand the issue and implement the fix.\n\
                 4. Run the project's test suite to verify your changes.\n\
                 5. If tests fail, fix the issues and re-run tests.\n\
                 6. Commit all fixes with message: \"fix: address review comments on PR #{pr_number}\"\n\
                 7. Push to the existing branch.\n\n\
                 Important:\n\
                 - Address EVERY review comment — do not skip any.\n\
                 - Do NOT modify files unrelated to the review comments.\n\
                 - If a comment is unclear, add a reply comment asking for clarification using `gh pr comment`."
            ),
        }
    }

    pub fn resume_implement(&self, issue_number: i64) -> String {
        let skills = self.skills_block();
        format!(
            "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
             Your task: CONTINUE implementing the feature or fix described in issue #{issue_number}.\n\
             {skills}\n\
             IMPORTANT CONTEXT: A previous agent was working on this issue but was interrupted by a\n\
             rate limit. The worktree has been preserved with all its in-progress work. You must\n\
             pick up where the previous agent left off — do NOT start from scratch.\n\n\
             Step 1 — Assess current state:\n\
             Run `git log --oneline -10` to see what commits have been made.\n\
             Run `git diff` and `git diff --cached` to see any uncommitted changes.\n\
             Run `gh issue view {issue_number}` to read the full implementation plan.\n\n\
             Step 2 — Determine what's left to do:\n\
             Compare the implementation plan with what's already been done.\n\
             Only implement the remaining parts that haven't been completed yet.\n\n\
             Step 3 — Continue implementation:\n\
             Pick up from where the previous agent stopped.\n\
             Follow AGENT.md coding standards for all code you write.\n\n\
             Step 4 — Test:\n\
             Run the project's test suite to verify all changes work.\n\
             If tests fail, fix the issues and re-run tests until they pass.\n\n\
             Step 5 — Commit and push:\n\
             Stage your changes and commit with a descriptive message referencing #{issue_number}.\n\
             Push the branch: `git push -u origin fix/issue-{issue_number}`\n\n\
             Step 6 — Create PR (if one doesn't exist yet):\n\
             Check first: `gh pr list --head fix/issue-{issue_number}`\n\
             If no PR exists, create one: `gh pr create --title \"Fix #{issue_number}: <concise title>\" --body \"Closes #{issue_number}\\n\\n<summary of what was implemented>\"`\n\
             If a PR already exists, just push — the PR will update automatically.\n\n\
             Important:\n\
             - Do NOT redo work that's already been completed.\n\
             - Check git log and file state before making any changes.\n\
             - The issue body IS the plan. Follow it precisely for remaining work."
        )
    }

    pub fn resume_fix_review(&self, pr_number: i64, unresolved_threads: Option<&[ReviewThread]>) -> String {
        let skills = self.skills_block();
        match unresolved_threads {
            Some(threads) => {
                let threads_block = format_unresolved_threads(threads);
                format!(
                    "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
                     Your task: CONTINUE fixing review comments on PR #{pr_number}.\n\
                     {skills}\n\
                     IMPORTANT CONTEXT: A previous agent was working on fixing review comments but was\n\
                     interrupted by a rate limit. The worktree has been preserved with all its in-progress\n\
                     work. You must pick up where the previous agent left off — do NOT start from scratch.\n\n\
                     There are {count} unresolved review thread(s) remaining. Here are the details:\n\n\
                     {threads_block}\n\
                     Steps:\n\
                     1. Run `git log --oneline -10` and `git diff` to see what's already been done.\n\
                     2. For each unresolved thread listed above, check if it has already been addressed by the previous agent. Only fix the remaining ones.\n\
                     3. Run the project's test suite to verify your changes.\n\
                     4. If tests fail, fix the issues and re-run tests.\n\
                     5. Commit all fixes with message: \"fix: address review comments on PR #{pr_number}\"\n\
                     6. Push to the existing branch.\n\n\
                     Important:\n\
                     - Do NOT redo fixes that are already committed.\n\
                     - Address every REMAINING unresolved thread listed above — do not skip any.\n\
                     - Do NOT modify files unrelated to the review comments.",
                    count = threads.len(),
                )
            }
            None => format!(
                "Read the AGENT.md file at the root of this repository FIRST and follow every guideline strictly.\n\n\
                 Your task: CONTINUE fixing review comments on PR #{pr_number}.\n\
                 {skills}\n\
                 IMPORTANT CONTEXT: A previous agent was working on fixing review comments but was\n\
                 interrupted by a rate limit. The worktree has been preserved with all its in-progress\n\
                 work. You must pick up where the previous agent left off — do NOT start from scratch.\n\n\
                 Steps:\n\
                 1. Run `git log --oneline -10` and `git diff` to see what's already been done.\n\
                 2. Run `gh pr view {pr_number} --comments` to see all PR comments.\n\
                 3. Run `gh api repos/{{owner}}/{{repo}}/pulls/{pr_number}/comments` to get inline review comment details.\n\
                 4. For each review comment, check if it has already been addressed by the previous agent. Only fix the remaining ones.\n\
                 5. Run the project's test suite to verify your changes.\n\
                 6. If tests fail, fix the issues and re-run tests.\n\
                 7. Commit all fixes with message: \"fix: address review comments on PR #{pr_number}\"\n\
                 8. Push to the existing branch.\n\n\
                 Important:\n\
                 - Do NOT redo fixes that are already committed.\n\
                 - Address every REMAINING review comment — do not skip any.\n\
                 - Do NOT modify files unrelated to the review comments."
            ),
        }
    }
}

fn format_unresolved_threads(threads: &[ReviewThread]) -> String {
    if threads.is_empty() {
        return "No unresolved review threads found.\n".to_string();
    }
    let mut out = String::new();
    for (i, thread) in threads.iter().enumerate() {
        let location = match thread.line {
            Some(line) => format!("{}:{line}", thread.path),
            None => thread.path.clone(),
        };
        out.push_str(&format!("--- Thread {}: {location} ---\n", i + 1));
        for comment in &thread.comments {
            out.push_str(&format!("  [{}]: {}\n", comment.author, comment.body.trim()));
        }
        out.push('\n');
    }
    out
}

/// Scans `<target_repo>/.claude/skills` and `~/.claude/skills` for installed
/// skill directories, returned sorted and deduplicated.
fn discover_installed_skills(target_repo_path: &Path) -> Vec<String> {
    let mut skills = Vec::new();

    if let Some(entries) = read_skill_dir(&target_repo_path.join(".claude").join("skills")) {
        skills.extend(entries);
    }
    if let Some(home) = dirs::home_dir() {
        if let Some(entries) = read_skill_dir(&home.join(".claude").join("skills")) {
            for entry in entries {
                if !skills.contains(&entry) {
                    skills.push(entry);
                }
            }
        }
    }
    skills.sort();
    skills
}

fn read_skill_dir(dir: &Path) -> Option<Vec<String>> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut skills = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir_or_symlink = path.is_dir() || path.is_symlink();
        if !is_dir_or_symlink {
            continue;
        }
        let skill_md = path.join("SKILL.md");
        if path.is_symlink() || skill_md.exists() {
            if let Some(name) = entry.file_name().to_str() {
                skills.push(name.to_string());
            }
        }
    }
    Some(skills)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implement_prompt_references_issue_number() {
        let builder = PromptBuilder::new("/tmp/nonexistent-repo", false);
        let prompt = builder.implement(42);
        assert!(prompt.contains("issue #42"));
        assert!(prompt.contains("fix/issue-42"));
    }

    #[test]
    fn fix_review_prompt_embeds_threads_when_provided() {
        let builder = PromptBuilder::new("/tmp/nonexistent-repo", false);
        let threads = vec![ReviewThread {
            is_resolved: false,
            path: "a.py".to_string(),
            line: Some(10),
            comments: vec![ReviewComment { body: "please fix this".to_string(), author: "reviewer".to_string() }],
        }];
        let prompt = builder.fix_review(77, Some(&threads));
        assert!(prompt.contains("a.py:10"));
        assert!(prompt.contains("please fix this"));
        assert!(prompt.contains("1 unresolved review thread"));
    }

    #[test]
    fn fix_review_prompt_falls_back_without_threads() {
        let builder = PromptBuilder::new("/tmp/nonexistent-repo", false);
        let prompt = builder.fix_review(77, None);
        assert!(prompt.contains("gh pr view 77"));
    }

    #[test]
    fn skills_block_empty_when_disabled() {
        let builder = PromptBuilder::new("/tmp/nonexistent-repo", false);
        assert!(!builder.implement(1).contains("Skills:"));
    }
}
