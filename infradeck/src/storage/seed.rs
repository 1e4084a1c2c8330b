//! Demo data loaded into a fresh store

use serde_json::json;
use tracing::info;

use crate::errors::DeckError;
use crate::models::ansible::NewAnsiblePlaybook;
use crate::models::deployment::{DeploymentStatus, NewDeployment};
use crate::models::resource::NewResource;
use crate::models::template::NewInfraTemplate;
use crate::models::terraform::NewTerraformConfig;
use crate::storage::provider::Storage;

const VPC_CONFIG: &str = r#"provider "aws" {
  region = var.aws_region
}

resource "aws_vpc" "main" {
  cidr_block = var.vpc_cidr
  tags = {
    Name = "main-vpc"
    Environment = var.environment
  }
}

resource "aws_subnet" "public" {
  count = length(var.public_subnets)
  vpc_id = aws_vpc.main.id
  cidr_block = var.public_subnets[count.index]
  availability_zone = var.availability_zones[count.index]

  tags = {
    Name = "Public-${count.index}"
  }
}"#;

const WEB_SERVER_PLAYBOOK: &str = r#"---
- name: Web Server Setup
  hosts: web_servers
  become: yes
  tasks:
    - name: Install Apache
      apt:
        name: apache2
        state: present
        update_cache: yes

    - name: Start and enable Apache
      service:
        name: apache2
        state: started
        enabled: yes

    - name: Copy website content
      copy:
        src: files/index.html
        dest: /var/www/html/index.html
        owner: www-data
        group: www-data
        mode: '0644'"#;

const DATABASE_PLAYBOOK: &str = r#"---
- name: Database Server Configuration
  hosts: db_servers
  become: yes
  tasks:
    - name: Install PostgreSQL
      apt:
        name: postgresql
        state: present
        update_cache: yes

    - name: Ensure PostgreSQL is started
      service:
        name: postgresql
        state: started
        enabled: yes

    - name: Create application database
      postgresql_db:
        name: app_database
        state: present
      become_user: postgres"#;

const SECURITY_PLAYBOOK: &str = r#"---
- name: Apply Security Patches
  hosts: all
  become: yes
  tasks:
    - name: Update apt cache
      apt:
        update_cache: yes

    - name: Apply security updates
      apt:
        upgrade: dist
        update_cache: yes
      register: update_result

    - name: Reboot if required
      reboot:
        msg: "Reboot required after security updates"
      when: update_result.changed"#;

const WEB_STACK_TEMPLATE: &str = r#"provider "aws" {
  region = var.aws_region
}

module "vpc" {
  source = "terraform-aws-modules/vpc/aws"
  name = "web-app-vpc"
  cidr = "10.0.0.0/16"
  azs             = ["us-west-2a", "us-west-2b", "us-west-2c"]
  private_subnets = ["10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
  public_subnets  = ["10.0.101.0/24", "10.0.102.0/24", "10.0.103.0/24"]
  database_subnets = ["10.0.201.0/24", "10.0.202.0/24"]

  enable_nat_gateway = true
  enable_vpn_gateway = false

  tags = {
    Environment = var.environment
    Project = var.project_name
  }
}"#;

const GKE_TEMPLATE: &str = r#"provider "google" {
  credentials = file(var.credentials_file)
  project     = var.project_id
  region      = var.region
}

resource "google_container_cluster" "primary" {
  name     = "my-gke-cluster"
  location = var.region

  remove_default_node_pool = true
  initial_node_count       = 1
}

resource "google_container_node_pool" "primary_preemptible_nodes" {
  name       = "my-node-pool"
  location   = var.region
  cluster    = google_container_cluster.primary.name
  node_count = var.gke_num_nodes

  node_config {
    preemptible  = true
    machine_type = var.machine_type

    oauth_scopes = [
      "https://www.googleapis.com/auth/compute",
      "https://www.googleapis.com/auth/devstorage.read_only",
      "https://www.googleapis.com/auth/logging.write",
      "https://www.googleapis.com/auth/monitoring",
    ]
  }
}"#;

const SERVERLESS_TEMPLATE: &str = r#"provider "aws" {
  region = var.aws_region
}

resource "aws_dynamodb_table" "api_table" {
  name           = "${var.project_name}-table"
  billing_mode   = "PAY_PER_REQUEST"
  hash_key       = "id"

  attribute {
    name = "id"
    type = "S"
  }
}

resource "aws_s3_bucket" "api_storage" {
  bucket = "${var.project_name}-storage"
  acl    = "private"
}

resource "aws_lambda_function" "api_lambda" {
  function_name = "${var.project_name}-function"
  role          = aws_iam_role.lambda_exec.arn
  handler       = "index.handler"
  runtime       = "nodejs14.x"
  filename      = "lambda.zip"
  source_code_hash = filebase64sha256("lambda.zip")
}

resource "aws_api_gateway_rest_api" "api_gateway" {
  name        = "${var.project_name}-api"
  description = "Serverless API Gateway"
}"#;

/// Populate the store with the demo inventory shown on a fresh dashboard
pub async fn seed_demo_data(storage: &dyn Storage) -> Result<(), DeckError> {
    info!("Seeding demo data...");

    let resources = [
        NewResource::new("Web Server 1", "server", "healthy")
            .with_details(json!({"id": "i-01234567890abcdef", "uptime": "7d 4h"})),
        NewResource::new("Web Server 2", "server", "warning").with_details(json!({
            "id": "i-abcdef01234567890",
            "uptime": "14d 2h",
            "warning": "CPU usage above 80% for last 30 minutes"
        })),
        NewResource::new("Web Server 3", "server", "healthy")
            .with_details(json!({"id": "i-567890abcdef01234", "uptime": "3d 12h"})),
        NewResource::new("Database Cluster", "database", "healthy")
            .with_details(json!({"id": "db-cluster-01", "uptime": "21d 8h"})),
        NewResource::new("Storage Volume", "storage", "error").with_details(json!({
            "id": "vol-01234abcdef",
            "state": "Degraded",
            "error": "Disk health check failed - possible hardware issue"
        })),
    ];
    for resource in resources {
        storage.create_resource(resource).await?;
    }

    let variables = json!({
        "aws_region": "us-west-2",
        "environment": "production",
        "vpc_cidr": "10.0.0.0/16",
        "instance_type": "t2.micro",
        "public_subnets": ["10.0.1.0/24", "10.0.2.0/24"],
        "availability_zones": ["us-west-2a", "us-west-2b"]
    });
    storage
        .create_terraform_config(NewTerraformConfig {
            name: "main.tf".to_string(),
            content: VPC_CONFIG.to_string(),
            variables: variables.as_object().cloned(),
        })
        .await?;

    for (name, content) in [
        ("web-server-setup.yml", WEB_SERVER_PLAYBOOK),
        ("database-configure.yml", DATABASE_PLAYBOOK),
        ("security-patch.yml", SECURITY_PLAYBOOK),
    ] {
        storage
            .create_ansible_playbook(NewAnsiblePlaybook {
                name: name.to_string(),
                content: content.to_string(),
            })
            .await?;
    }

    let templates = [
        (
            "Web Application Stack",
            "Standard web application architecture with load balancer, auto-scaling group, and RDS database.",
            "AWS",
            WEB_STACK_TEMPLATE,
        ),
        (
            "Kubernetes Cluster",
            "Production-ready Kubernetes cluster with monitoring and logging.",
            "GCP",
            GKE_TEMPLATE,
        ),
        (
            "Serverless API",
            "Lambda functions with API Gateway, DynamoDB, and S3 storage.",
            "AWS",
            SERVERLESS_TEMPLATE,
        ),
    ];
    for (name, description, provider, content) in templates {
        storage
            .create_template(NewInfraTemplate {
                name: name.to_string(),
                description: Some(description.to_string()),
                provider: provider.to_string(),
                content: content.to_string(),
            })
            .await?;
    }

    let deployments = [
        (
            "Web Application Stack Deployment",
            DeploymentStatus::InProgress,
            "Provisioning VPC infrastructure...",
        ),
        (
            "Database Backup Restore",
            DeploymentStatus::Completed,
            "Database restored successfully from backup.",
        ),
        ("Security Patches Application", DeploymentStatus::Pending, ""),
    ];
    for (name, status, logs) in deployments {
        storage
            .create_deployment(NewDeployment {
                name: name.to_string(),
                status,
                logs: logs.to_string(),
            })
            .await?;
    }

    Ok(())
}
