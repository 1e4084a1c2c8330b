//! Canned command stages and simulated console scripts

use std::time::Duration;

/// One line of simulated console output, emitted after `delay_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    pub message: &'static str,
    pub delay_ms: u64,
}

impl ScriptStep {
    const fn new(message: &'static str, delay_ms: u64) -> Self {
        Self { message, delay_ms }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

pub const TERRAFORM_APPLY_SCRIPT: &[ScriptStep] = &[
    ScriptStep::new("Initializing plugins...", 1000),
    ScriptStep::new("Planning infrastructure changes...", 2000),
    ScriptStep::new("Plan: 3 to add, 0 to change, 0 to destroy.", 1500),
    ScriptStep::new("Applying changes...", 3000),
    ScriptStep::new("Creating AWS VPC...", 2000),
    ScriptStep::new("Creating public subnets...", 2500),
    ScriptStep::new("Configuring route tables...", 1800),
    ScriptStep::new("Apply complete! Resources: 3 added, 0 changed, 0 destroyed.", 1000),
];

pub const ANSIBLE_RUN_SCRIPT: &[ScriptStep] = &[
    ScriptStep::new("PLAY [web servers] **********************************************************", 800),
    ScriptStep::new("TASK [Gathering Facts] *****************************************************", 1200),
    ScriptStep::new("ok: [web1.example.com]", 500),
    ScriptStep::new("ok: [web2.example.com]", 600),
    ScriptStep::new("ok: [web3.example.com]", 700),
    ScriptStep::new("TASK [Install Apache] ******************************************************", 1500),
    ScriptStep::new("ok: [web1.example.com]", 800),
    ScriptStep::new("ok: [web3.example.com]", 700),
    ScriptStep::new("changed: [web2.example.com]", 1200),
    ScriptStep::new("TASK [Start and enable Apache] ********************************************", 1300),
    ScriptStep::new("ok: [web1.example.com]", 600),
    ScriptStep::new("ok: [web3.example.com]", 700),
    ScriptStep::new("changed: [web2.example.com]", 900),
    ScriptStep::new("TASK [Copy website content] ***********************************************", 1100),
    ScriptStep::new("ok: [web1.example.com]", 500),
    ScriptStep::new("ok: [web2.example.com]", 600),
    ScriptStep::new("ok: [web3.example.com]", 700),
    ScriptStep::new("PLAY RECAP ****************************************************************", 900),
    ScriptStep::new("web1.example.com : ok=4 changed=0 unreachable=0 failed=0", 500),
    ScriptStep::new("web2.example.com : ok=2 changed=2 unreachable=0 failed=0", 600),
    ScriptStep::new("web3.example.com : ok=4 changed=0 unreachable=0 failed=0", 700),
];

/// Stages for a local Terraform apply, run in the workspace
pub fn terraform_local_stages() -> Vec<String> {
    [
        r#"if [ -s main.tf ]; then echo "Configuration files found: main.tf"; else echo "Error: No configuration files" >&2; exit 1; fi"#,
        r#"echo "Initializing terraform in local environment..." && sleep 2 && echo "Terraform has been successfully initialized!""#,
        r#"echo "Planning terraform deployment..." && sleep 3 && echo "Plan: 3 to add, 0 to change, 0 to destroy.""#,
        r#"echo "Applying terraform changes..." && sleep 5 && echo "Apply complete! Resources: 3 added, 0 changed, 0 destroyed.""#,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Stages for a local Ansible run, run in the workspace
pub fn ansible_local_stages() -> Vec<String> {
    [
        r#"if grep -q 'hosts:' playbook.yml; then echo "playbook: playbook.yml"; else echo "ERROR! playbook.yml must contain at least one play with a 'hosts' entry" >&2; exit 4; fi"#,
        concat!(
            r#"echo "PLAY [localhost]" && sleep 1 && "#,
            r#"echo "TASK [Gathering Facts]" && sleep 2 && "#,
            r#"echo "ok: [localhost]" && sleep 1 && "#,
            r#"echo "TASK [Echo message]" && sleep 1 && "#,
            r#"echo "changed: [localhost]" && sleep 1 && "#,
            r#"echo "PLAY RECAP" && sleep 1 && "#,
            r#"echo "localhost : ok=2 changed=1 unreachable=0 failed=0""#,
        ),
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
