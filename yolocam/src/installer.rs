//! Recognition-engine container lifecycle, driven by the `yolocam-installer`
//! binary. Shells out to the host `docker` CLI the way the original
//! `sdk.py` does, but parses its tabular output into typed records instead
//! of scanning column offsets out of `docker ps`/`docker image list` text.

use anyhow::{Context, Result};
use std::process::{Command, Output};

const IMAGE: &str = "platerecognizer/alpr";

#[derive(Debug, Clone)]
pub struct DockerContainer {
    pub container_id: String,
    pub image: String,
    pub status: String,
    pub ports: String,
    pub names: String,
}

#[derive(Debug, Clone)]
pub struct DockerImage {
    pub repository: String,
    pub tag: String,
    pub image_id: String,
}

fn run(args: &[&str]) -> Result<Output> {
    Command::new("docker")
        .args(args)
        .output()
        .with_context(|| format!("failed to run `docker {}`", args.join(" ")))
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect()
}

/// `docker ps -a --format`, parsed field-by-field rather than by fixed
/// column offsets (the original's approach, fragile against locale/width).
pub fn get_all_containers() -> Result<Vec<DockerContainer>> {
    let output = run(&["ps", "-a", "--format", "{{.ID}}|{{.Image}}|{{.Status}}|{{.Ports}}|{{.Names}}"])?;
    Ok(stdout_lines(&output)
        .into_iter()
        .filter_map(|line| {
            let mut parts = line.splitn(5, '|');
            Some(DockerContainer {
                container_id: parts.next()?.to_string(),
                image: parts.next()?.to_string(),
                status: parts.next()?.to_string(),
                ports: parts.next()?.to_string(),
                names: parts.next()?.to_string(),
            })
        })
        .collect())
}

pub fn get_all_images() -> Result<Vec<DockerImage>> {
    let output = run(&["image", "list", "--format", "{{.Repository}}|{{.Tag}}|{{.ID}}"])?;
    Ok(stdout_lines(&output)
        .into_iter()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '|');
            Some(DockerImage {
                repository: parts.next()?.to_string(),
                tag: parts.next()?.to_string(),
                image_id: parts.next()?.to_string(),
            })
        })
        .collect())
}

pub fn get_running_sdk() -> Result<Option<DockerContainer>> {
    Ok(get_all_containers()?
        .into_iter()
        .find(|c| c.image == IMAGE && c.status.starts_with("Up")))
}

pub fn pull_sdk_image() -> Result<bool> {
    let output = run(&["pull", IMAGE])?;
    let text = String::from_utf8_lossy(&output.stdout);
    Ok(output.status.success() && !text.contains("Error"))
}

pub fn stop_container(id: &str) -> Result<bool> {
    let output = run(&["stop", id])?;
    Ok(output.status.success())
}

pub fn remove_container(id: &str) -> Result<bool> {
    let output = run(&["rm", id])?;
    Ok(output.status.success())
}

pub fn remove_image(id: &str) -> Result<bool> {
    let output = run(&["rmi", "-f", id])?;
    Ok(output.status.success())
}

fn has_latest_image() -> Result<bool> {
    Ok(get_all_images()?.iter().any(|i| i.repository == IMAGE && i.tag == "latest"))
}

/// `docker run -d --restart always -t -p 8100:8080 -v license:/license
/// -e TOKEN=<token> -e LICENSE_KEY=<license> platerecognizer/alpr`.
pub fn install_sdk(token: &str, license_key: &str) -> Result<bool> {
    if !has_latest_image()? {
        anyhow::bail!("{IMAGE}:latest image not found; pull it first");
    }
    let token_env = format!("TOKEN={token}");
    let license_env = format!("LICENSE_KEY={license_key}");
    let output = run(&[
        "run", "-d", "--restart", "always", "-t", "-p", "8100:8080", "-v", "license:/license", "-e", &token_env, "-e",
        &license_env, IMAGE,
    ])?;
    Ok(output.status.success())
}

pub fn uninstall_sdk(token: &str) -> Result<bool> {
    let token_env = format!("TOKEN={token}");
    let output = run(&["run", "--rm", "-t", "-v", "license:/license", "-e", &token_env, "-e", "UNINSTALL=1", IMAGE])?;
    Ok(output.status.success())
}

/// `{install, uninstall, update}` flow driving the container lifecycle.
pub fn install(token: &str, license: Option<&str>) -> Result<()> {
    if !pull_sdk_image()? {
        anyhow::bail!("failed to pull {IMAGE}");
    }
    if !install_sdk(token, license.unwrap_or(""))? {
        anyhow::bail!("failed to start {IMAGE} container");
    }
    Ok(())
}

pub fn uninstall(token: &str) -> Result<()> {
    if let Some(running) = get_running_sdk()? {
        stop_container(&running.container_id)?;
        remove_container(&running.container_id)?;
    }
    uninstall_sdk(token)?;
    Ok(())
}

pub fn update(token: &str, license: Option<&str>) -> Result<()> {
    pull_sdk_image()?;
    if let Some(running) = get_running_sdk()? {
        stop_container(&running.container_id)?;
        remove_container(&running.container_id)?;
    }
    if !install_sdk(token, license.unwrap_or(""))? {
        anyhow::bail!("failed to restart {IMAGE} container after update");
    }
    Ok(())
}
