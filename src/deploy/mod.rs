//! Coordinator deployment
//!
//! [`Deployer`] starts and stops the coordinator service of a provisioned
//! load-test deployment:
//!
//! - Checks the deployment preconditions
//! - Reads fresh inventory and picks the coordinator host
//! - Synthesizes the agent list and coordinator config
//! - Uploads both documents and starts the service (start)
//! - Stops the service (stop)
//!
//! Every operation is a single fail-fast pass. Remote side effects are never
//! rolled back; a failure reports which [`Step`]s had already completed.
//!
//! # Example
//!
//! ```
//! use ltdeploy::deploy::{Deployer, SERVICE_STOP_COMMAND};
//! use ltdeploy::inventory::{AgentHost, InfrastructureOutput, MetricsServer, StaticInventory};
//! use ltdeploy::preflight::NoopPreflight;
//! use ltdeploy::remote::mock::MockExecutor;
//!
//! let inventory = InfrastructureOutput {
//!     agents: vec![AgentHost {
//!         name: "agent-0".to_string(),
//!         private_ip: "10.0.0.5".to_string(),
//!         public_ip: "1.2.3.4".to_string(),
//!     }],
//!     metrics_server: MetricsServer { private_ip: "10.0.0.9".to_string() },
//!     coordinator: None,
//! };
//! let executor = MockExecutor::new();
//! let deployer = Deployer::new(
//!     Box::new(NoopPreflight),
//!     Box::new(StaticInventory::new(inventory)),
//!     Box::new(executor.clone()),
//! );
//!
//! let report = deployer.stop_coordinator()?;
//! assert_eq!(report.address, "1.2.3.4");
//! assert_eq!(executor.commands()[0].command, SERVICE_STOP_COMMAND);
//! # Ok::<(), ltdeploy::DeployFailure>(())
//! ```

pub mod synth;

use crate::config::DeployerConfig;
use crate::coordinator::{self, LoadAgentConfig};
use crate::error::{DeployError, DeployFailure, DeployResult};
use crate::inventory::terraform::{FileInventory, TerraformInventory};
use crate::inventory::{InfrastructureOutput, InventoryReader};
use crate::preflight::{InventoryFilePreflight, NoopPreflight, PreflightCheck, TerraformPreflight};
use crate::remote::ssh::SshExecutor;
use crate::remote::{RemoteExecutor, RemoteSession};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

macro_rules! remote_path {
    ($rel:literal) => {
        concat!("/home/ubuntu/mattermost-load-test-ng/", $rel)
    };
}

/// Load-test checkout on the coordinator host
pub const REMOTE_BASE_DIR: &str = remote_path!("");

/// Where the agent list is written on the coordinator host
pub const AGENT_CONFIG_PATH: &str = remote_path!("config/config.json");

/// Where the coordinator config is written on the coordinator host
pub const COORDINATOR_CONFIG_PATH: &str = remote_path!("config/coordinator.json");

pub const SERVICE_START_COMMAND: &str = "sudo service ltcoordinator start";
pub const SERVICE_STOP_COMMAND: &str = "sudo service ltcoordinator stop";

/// A completed stage of a deployment operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Preconditions passed
    Preflight,
    /// Inventory fetched and non-empty
    Inventory,
    /// Remote session open
    Connect,
    /// Both documents built and serialized
    Synthesize,
    /// Agent list written to [`AGENT_CONFIG_PATH`]
    UploadAgentConfig,
    /// Coordinator config written to [`COORDINATOR_CONFIG_PATH`]
    UploadCoordinatorConfig,
    /// Start command accepted
    ServiceStart,
    /// Stop command accepted
    ServiceStop,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Preflight => "preflight",
            Step::Inventory => "inventory",
            Step::Connect => "connect",
            Step::Synthesize => "synthesize",
            Step::UploadAgentConfig => "upload agent config",
            Step::UploadCoordinatorConfig => "upload coordinator config",
            Step::ServiceStart => "service start",
            Step::ServiceStop => "service stop",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful start
#[derive(Debug, Clone, PartialEq)]
pub struct StartReport {
    /// Host the coordinator was started on
    pub address: String,
    /// Agents the coordinator was configured with
    pub agents: Vec<LoadAgentConfig>,
    pub steps: Vec<Step>,
}

/// Outcome of a successful stop
#[derive(Debug, Clone, PartialEq)]
pub struct StopReport {
    pub address: String,
    pub steps: Vec<Step>,
}

/// Everything a start would upload, computed without remote contact
#[derive(Debug, Clone, PartialEq)]
pub struct StartPlan {
    pub address: String,
    pub agents: Vec<LoadAgentConfig>,
    /// Serialized agent list for [`AGENT_CONFIG_PATH`]
    pub agent_config_json: String,
    /// Serialized coordinator config for [`COORDINATOR_CONFIG_PATH`]
    pub coordinator_config_json: String,
}

/// Steps completed so far in one operation
#[derive(Debug, Default)]
struct Progress {
    completed: Vec<Step>,
}

impl Progress {
    fn done(&mut self, step: Step) {
        self.completed.push(step);
    }

    fn fail(&self, error: DeployError) -> DeployFailure {
        DeployFailure::new(error, self.completed.clone())
    }
}

/// Starts and stops the coordinator of one deployment
pub struct Deployer {
    preflight: Box<dyn PreflightCheck>,
    inventory: Box<dyn InventoryReader>,
    executor: Box<dyn RemoteExecutor>,
    /// Baseline coordinator config; built-in default when `None`
    coordinator_config_path: Option<PathBuf>,
}

impl Deployer {
    pub fn new(
        preflight: Box<dyn PreflightCheck>,
        inventory: Box<dyn InventoryReader>,
        executor: Box<dyn RemoteExecutor>,
    ) -> Self {
        Self {
            preflight,
            inventory,
            executor,
            coordinator_config_path: None,
        }
    }

    /// Build a deployer that talks to terraform and ssh
    ///
    /// Inventory comes from `terraform output -json`, or from the saved dump
    /// when `terraform.inventory_file` is set.
    pub fn from_config(config: &DeployerConfig, skip_preflight: bool) -> Self {
        let (preflight, inventory): (Box<dyn PreflightCheck>, Box<dyn InventoryReader>) =
            match config.terraform.inventory_file {
                Some(ref file) => (
                    Box::new(InventoryFilePreflight::new(file)),
                    Box::new(FileInventory::new(file)),
                ),
                None => (
                    Box::new(TerraformPreflight::new(
                        &config.terraform.binary,
                        &config.terraform.working_dir,
                    )),
                    Box::new(TerraformInventory::new(
                        &config.terraform.binary,
                        &config.terraform.working_dir,
                    )),
                ),
            };
        let preflight: Box<dyn PreflightCheck> = if skip_preflight {
            Box::new(NoopPreflight)
        } else {
            preflight
        };

        Self::new(preflight, inventory, Box::new(SshExecutor::new(&config.ssh)))
            .with_coordinator_config(config.coordinator.config_path.clone())
    }

    /// Use `path` as the baseline coordinator config
    pub fn with_coordinator_config(mut self, path: Option<PathBuf>) -> Self {
        self.coordinator_config_path = path;
        self
    }

    /// Upload fresh configuration to the coordinator host and start the service
    ///
    /// Config files are overwritten on every call and the start command is
    /// always issued, even if the service is already running.
    pub fn start_coordinator(&self) -> DeployResult<StartReport> {
        let mut progress = Progress::default();
        let (output, address) = self.resolve_target(&mut progress)?;
        info!(ip = %address, "Setting up coordinator");

        let mut session = self.connect(&address, &mut progress)?;

        let plan = self
            .synthesize(&output, address)
            .map_err(|e| progress.fail(e))?;
        progress.done(Step::Synthesize);

        info!("Uploading updated load-test agent config file");
        upload(session.as_mut(), &plan.agent_config_json, AGENT_CONFIG_PATH)
            .map_err(|e| progress.fail(e))?;
        progress.done(Step::UploadAgentConfig);

        info!("Uploading updated coordinator config file");
        upload(session.as_mut(), &plan.coordinator_config_json, COORDINATOR_CONFIG_PATH)
            .map_err(|e| progress.fail(e))?;
        progress.done(Step::UploadCoordinatorConfig);

        info!("Starting the coordinator");
        run_service_command(session.as_mut(), SERVICE_START_COMMAND)
            .map_err(|e| progress.fail(e))?;
        progress.done(Step::ServiceStart);

        info!("Done");
        Ok(StartReport {
            address: plan.address,
            agents: plan.agents,
            steps: progress.completed,
        })
    }

    /// Stop the coordinator service
    ///
    /// Targets the same host as [`Deployer::start_coordinator`]. Nothing is
    /// uploaded.
    pub fn stop_coordinator(&self) -> DeployResult<StopReport> {
        let mut progress = Progress::default();
        let (_, address) = self.resolve_target(&mut progress)?;

        let mut session = self.connect(&address, &mut progress)?;

        info!(ip = %address, "Stopping the coordinator");
        run_service_command(session.as_mut(), SERVICE_STOP_COMMAND)
            .map_err(|e| progress.fail(e))?;
        progress.done(Step::ServiceStop);

        info!("Done");
        Ok(StopReport {
            address,
            steps: progress.completed,
        })
    }

    /// Compute what a start would upload, without contacting any host
    pub fn plan_start(&self) -> DeployResult<StartPlan> {
        let mut progress = Progress::default();
        let (output, address) = self.resolve_target(&mut progress)?;
        self.synthesize(&output, address).map_err(|e| progress.fail(e))
    }

    /// Preflight, inventory and coordinator host selection
    fn resolve_target(
        &self,
        progress: &mut Progress,
    ) -> DeployResult<(InfrastructureOutput, String)> {
        self.preflight
            .check()
            .map_err(|e| progress.fail(DeployError::Preflight(e)))?;
        progress.done(Step::Preflight);

        let output = self
            .inventory
            .output()
            .map_err(|e| progress.fail(DeployError::Inventory(e)))?;
        if !output.has_agents() {
            return Err(progress.fail(DeployError::EmptyFleet));
        }
        let address = output
            .coordinator_address()
            .ok_or_else(|| progress.fail(DeployError::EmptyFleet))?
            .to_string();
        progress.done(Step::Inventory);

        Ok((output, address))
    }

    fn connect(
        &self,
        address: &str,
        progress: &mut Progress,
    ) -> DeployResult<Box<dyn RemoteSession>> {
        let session = self.executor.connect(address).map_err(|source| {
            progress.fail(DeployError::Connection {
                address: address.to_string(),
                source,
            })
        })?;
        progress.done(Step::Connect);
        Ok(session)
    }

    /// Build and serialize both documents
    fn synthesize(
        &self,
        output: &InfrastructureOutput,
        address: String,
    ) -> Result<StartPlan, DeployError> {
        let agents = synth::load_agent_configs(&output.agents);

        let baseline = coordinator::read_config(self.coordinator_config_path.as_deref())
            .map_err(DeployError::ConfigLoad)?;
        let coordinator_config =
            synth::coordinator_config(baseline, &agents, &output.metrics_server)
                .map_err(DeployError::ConfigLoad)?;

        let agent_config_json =
            serde_json::to_string_pretty(&agents).map_err(|source| DeployError::Serialize {
                document: "agent config",
                source,
            })?;
        let coordinator_config_json =
            coordinator_config
                .to_json_pretty()
                .map_err(|source| DeployError::Serialize {
                    document: "coordinator config",
                    source,
                })?;

        Ok(StartPlan {
            address,
            agents,
            agent_config_json,
            coordinator_config_json,
        })
    }
}

fn upload(session: &mut dyn RemoteSession, contents: &str, path: &str) -> Result<(), DeployError> {
    session
        .upload(contents.as_bytes(), path, false)
        .map_err(|source| DeployError::Upload {
            path: path.to_string(),
            output: source.output.clone(),
            source,
        })?;
    info!(address = session.address(), path, "Upload done");
    Ok(())
}

fn run_service_command(session: &mut dyn RemoteSession, command: &str) -> Result<(), DeployError> {
    session
        .run(command)
        .map_err(|source| DeployError::ServiceControl {
            command: command.to_string(),
            output: source.output.clone(),
            source,
        })?;
    Ok(())
}
