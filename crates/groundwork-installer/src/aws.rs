//! AWS infrastructure orchestration
//!
//! The dependency graph is fixed. Buckets and the VPC have no dependency on
//! each other and run concurrently; everything inside the VPC is strictly
//! sequential up to the fork where the EKS control plane and the Aurora
//! pair provision side by side. Every step is an idempotent ensure, so
//! re-running the whole graph against partial infrastructure only fills the
//! gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use groundwork_aws::api::{
    AutoscalingApi, Ec2Api, EksApi, EksSpec, IamApi, RdsApi, Route53Api, RouteTarget, S3Api,
    StsApi, SubnetSpec,
};
use groundwork_aws::autoscaling::{node_user_data, AutoscalingGroup, LaunchConfiguration};
use groundwork_aws::eks::EksCluster;
use groundwork_aws::iam::{IamPolicy, IamRole, InstanceProfile};
use groundwork_aws::kubeconfig::kubeconfig_for_eks;
use groundwork_aws::network::{
    ElasticIp, InternetGateway, NatGateway, RouteTable, SubnetSet, Vpc, VpcEndpoint,
};
use groundwork_aws::rds::{DbSubnetGroup, RdsCluster, RdsInstance};
use groundwork_aws::route53::HostedZone;
use groundwork_aws::s3::S3Bucket;
use groundwork_aws::security::{apply_cluster_rules, apply_db_rules, SecurityGroup};
use groundwork_aws::sts::preflight_account_id;
use groundwork_aws::policies;
use groundwork_cloud::{ensure_absent, ensure_exists};
use groundwork_common::{ClusterConfig, Error, Result, CLUSTER_DB_NAME};

use crate::result::ClusterInfraResult;

/// VPC address plan
const VPC_CIDR: &str = "10.0.0.0/16";

const EKS_CLUSTER_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKSClusterPolicy";
const EKS_SERVICE_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKSServicePolicy";
const EKS_WORKER_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKSWorkerNodePolicy";
const EKS_CNI_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy";
const ECR_READONLY_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly";

/// All AWS API seams bundled for the orchestrator
#[derive(Clone)]
pub struct AwsApis {
    pub ec2: Arc<dyn Ec2Api>,
    pub iam: Arc<dyn IamApi>,
    pub s3: Arc<dyn S3Api>,
    pub eks: Arc<dyn EksApi>,
    pub rds: Arc<dyn RdsApi>,
    pub route53: Arc<dyn Route53Api>,
    pub sts: Arc<dyn StsApi>,
    pub autoscaling: Arc<dyn AutoscalingApi>,
}

/// Infrastructure facts beyond the common result
pub struct AwsInfra {
    pub result: ClusterInfraResult,
    pub node_role_arn: String,
    pub zone_id: String,
}

/// Subnets: two public and two private across two availability zones,
/// since the managed control plane requires at least two
fn subnet_plan(region: &str, zone_suffix: &str) -> Vec<SubnetSpec> {
    let second_suffix = if zone_suffix == "a" { "b" } else { "a" };
    vec![
        SubnetSpec {
            cidr_block: "10.0.0.0/24".to_string(),
            availability_zone: format!("{region}{zone_suffix}"),
            public: true,
        },
        SubnetSpec {
            cidr_block: "10.0.1.0/24".to_string(),
            availability_zone: format!("{region}{second_suffix}"),
            public: true,
        },
        SubnetSpec {
            cidr_block: "10.0.64.0/18".to_string(),
            availability_zone: format!("{region}{zone_suffix}"),
            public: false,
        },
        SubnetSpec {
            cidr_block: "10.0.128.0/18".to_string(),
            availability_zone: format!("{region}{second_suffix}"),
            public: false,
        },
    ]
}

pub async fn ensure_infra_exists(cfg: &ClusterConfig, apis: &AwsApis) -> Result<AwsInfra> {
    let aws = cfg
        .aws
        .as_ref()
        .ok_or_else(|| Error::config_field("aws", "required for provider aws"))?;
    let name = cfg.cluster_name.clone();

    let account_id = preflight_account_id(apis.sts.as_ref()).await?;
    info!(cluster = %name, %account_id, "provisioning AWS infrastructure");

    let zone = ensure_exists(&HostedZone {
        api: apis.route53.clone(),
        cluster_name: name.clone(),
        dns_name: cfg.dns_name.clone(),
    })
    .await?;

    // Buckets and VPC are independent.
    let loki_bucket = S3Bucket {
        api: apis.s3.clone(),
        cluster_name: name.clone(),
        bucket_name: cfg.bucket_name("loki"),
        region: aws.region.clone(),
        retention_days: cfg.log_retention_days,
    };
    let cortex_bucket = S3Bucket {
        api: apis.s3.clone(),
        cluster_name: name.clone(),
        bucket_name: cfg.bucket_name("cortex"),
        region: aws.region.clone(),
        retention_days: cfg.metric_retention_days,
    };
    let vpc = Vpc {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        cidr_block: VPC_CIDR.to_string(),
    };
    let (_, _, vpc_desc) = tokio::try_join!(
        ensure_exists(&loki_bucket),
        ensure_exists(&cortex_bucket),
        ensure_exists(&vpc),
    )?;
    info!(vpc = %vpc_desc.id, "network fabric root ready");

    let subnets = ensure_exists(&SubnetSet {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
        specs: subnet_plan(&aws.region, &aws.zone_suffix),
    })
    .await?;
    let public_subnet_ids: Vec<String> = subnets
        .iter()
        .filter(|s| s.public)
        .map(|s| s.id.clone())
        .collect();
    let private_subnet_ids: Vec<String> = subnets
        .iter()
        .filter(|s| !s.public)
        .map(|s| s.id.clone())
        .collect();
    let all_subnet_ids: Vec<String> = subnets.iter().map(|s| s.id.clone()).collect();
    let first_public = public_subnet_ids
        .first()
        .ok_or_else(|| Error::api("aws", &name, "no public subnet materialized"))?
        .clone();

    ensure_exists(&DbSubnetGroup {
        api: apis.rds.clone(),
        cluster_name: name.clone(),
        group_name: format!("{name}-db-subnets"),
        subnet_ids: private_subnet_ids.clone(),
    })
    .await?;

    let igw = ensure_exists(&InternetGateway {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
    })
    .await?;
    apis.ec2
        .attach_internet_gateway(&igw.id, &vpc_desc.id)
        .await?;

    let eip = ensure_exists(&ElasticIp {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
    })
    .await?;

    let nat = ensure_exists(&NatGateway {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        public_subnet_id: first_public,
        allocation_id: eip.allocation_id.clone(),
    })
    .await?;

    let public_table = ensure_exists(&RouteTable {
        api: apis.ec2.clone(),
        table_name: format!("{name}-public"),
        vpc_id: vpc_desc.id.clone(),
    })
    .await?;
    let private_table = ensure_exists(&RouteTable {
        api: apis.ec2.clone(),
        table_name: format!("{name}-private"),
        vpc_id: vpc_desc.id.clone(),
    })
    .await?;
    apis.ec2
        .ensure_route(
            &public_table.id,
            "0.0.0.0/0",
            &RouteTarget::InternetGateway(igw.id.clone()),
        )
        .await?;
    apis.ec2
        .ensure_route(
            &private_table.id,
            "0.0.0.0/0",
            &RouteTarget::NatGateway(nat.id.clone()),
        )
        .await?;
    for subnet_id in &public_subnet_ids {
        apis.ec2
            .associate_route_table(&public_table.id, subnet_id)
            .await?;
    }
    for subnet_id in &private_subnet_ids {
        apis.ec2
            .associate_route_table(&private_table.id, subnet_id)
            .await?;
    }

    ensure_exists(&VpcEndpoint {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
        service_name: format!("com.amazonaws.{}.s3", aws.region),
        route_table_ids: vec![public_table.id.clone(), private_table.id.clone()],
    })
    .await?;

    // IAM: policies first, then roles, then attachments.
    let dns_policy = ensure_exists(&IamPolicy {
        api: apis.iam.clone(),
        policy_name: format!("{name}-externaldns"),
        document: policies::route53_change_document(&zone.id),
    })
    .await?;
    let loki_policy = ensure_exists(&IamPolicy {
        api: apis.iam.clone(),
        policy_name: format!("{name}-loki-s3"),
        document: policies::s3_access_document(&cfg.bucket_name("loki")),
    })
    .await?;
    let cortex_policy = ensure_exists(&IamPolicy {
        api: apis.iam.clone(),
        policy_name: format!("{name}-cortex-s3"),
        document: policies::s3_access_document(&cfg.bucket_name("cortex")),
    })
    .await?;

    let controlplane_role = ensure_exists(&IamRole {
        api: apis.iam.clone(),
        role_name: format!("{name}-eks-controlplane"),
        assume_role_policy: policies::eks_assume_role_document(),
    })
    .await?;
    let node_role = ensure_exists(&IamRole {
        api: apis.iam.clone(),
        role_name: format!("{name}-eks-nodes"),
        assume_role_policy: policies::ec2_assume_role_document(),
    })
    .await?;
    let cert_manager_role = ensure_exists(&IamRole {
        api: apis.iam.clone(),
        role_name: format!("{name}-cert-manager"),
        assume_role_policy: policies::ec2_assume_role_document(),
    })
    .await?;

    for policy_arn in [EKS_CLUSTER_POLICY_ARN, EKS_SERVICE_POLICY_ARN] {
        apis.iam
            .attach_role_policy(&controlplane_role.name, policy_arn)
            .await?;
    }
    for policy_arn in [
        EKS_WORKER_POLICY_ARN,
        EKS_CNI_POLICY_ARN,
        ECR_READONLY_POLICY_ARN,
    ] {
        apis.iam
            .attach_role_policy(&node_role.name, policy_arn)
            .await?;
    }
    apis.iam
        .attach_role_policy(&node_role.name, &loki_policy.arn)
        .await?;
    apis.iam
        .attach_role_policy(&node_role.name, &cortex_policy.arn)
        .await?;
    apis.iam
        .attach_role_policy(&cert_manager_role.name, &dns_policy.arn)
        .await?;

    let master_sg = ensure_exists(&SecurityGroup {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
        group_name: format!("{name}-master"),
        description: "control plane".to_string(),
    })
    .await?;
    let worker_sg = ensure_exists(&SecurityGroup {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
        group_name: format!("{name}-worker"),
        description: "worker nodes".to_string(),
    })
    .await?;
    let db_sg = ensure_exists(&SecurityGroup {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: vpc_desc.id.clone(),
        group_name: format!("{name}-db"),
        description: "database".to_string(),
    })
    .await?;
    apply_cluster_rules(apis.ec2.as_ref(), &master_sg.id, &worker_sg.id).await?;
    apply_db_rules(apis.ec2.as_ref(), &db_sg.id, &worker_sg.id).await?;

    // Control plane and database provision side by side.
    let eks = EksCluster {
        api: apis.eks.clone(),
        cluster_name: name.clone(),
        spec: EksSpec {
            role_arn: controlplane_role.arn.clone(),
            subnet_ids: all_subnet_ids,
            security_group_ids: vec![master_sg.id.clone()],
            public_access_cidrs: cfg.authorized_networks.clone(),
        },
    };
    let rds_pair = async {
        let db_cluster = ensure_exists(&RdsCluster {
            api: apis.rds.clone(),
            cluster_name: name.clone(),
            db_cluster_id: format!("{name}-db"),
            subnet_group: format!("{name}-db-subnets"),
            security_group_id: db_sg.id.clone(),
        })
        .await?;
        ensure_exists(&RdsInstance {
            api: apis.rds.clone(),
            db_instance_id: format!("{name}-db-0"),
            db_cluster_id: format!("{name}-db"),
            instance_class: "db.t3.medium".to_string(),
        })
        .await?;
        Ok::<_, Error>(db_cluster)
    };
    let (eks_desc, db_cluster) = tokio::try_join!(ensure_exists(&eks), rds_pair)?;
    info!(cluster = %name, "control plane and database ready");

    let kubeconfig = kubeconfig_for_eks(&aws.region, &eks_desc)?;
    let db_endpoint = db_cluster
        .endpoint
        .ok_or_else(|| Error::api("aws", format!("{name}-db"), "database has no endpoint yet"))?;

    // Worker node group.
    let profile = ensure_exists(&InstanceProfile {
        api: apis.iam.clone(),
        profile_name: format!("{name}-nodes"),
    })
    .await?;
    apis.iam
        .add_role_to_instance_profile(&profile.name, &node_role.name)
        .await?;
    ensure_exists(&LaunchConfiguration {
        api: apis.autoscaling.clone(),
        config_name: format!("{name}-launch-config"),
        instance_type: aws.instance_type.clone(),
        instance_profile_arn: profile.arn.clone(),
        security_group_id: worker_sg.id.clone(),
        user_data: node_user_data(&name),
    })
    .await?;
    ensure_exists(&AutoscalingGroup {
        api: apis.autoscaling.clone(),
        cluster_name: name.clone(),
        group_name: format!("{name}-workers"),
        launch_configuration: format!("{name}-launch-config"),
        subnet_ids: private_subnet_ids,
        desired_capacity: cfg.node_count,
    })
    .await?;

    let mut component_identities = BTreeMap::new();
    component_identities.insert("cert-manager".to_string(), cert_manager_role.arn.clone());
    component_identities.insert("external-dns".to_string(), cert_manager_role.arn);

    Ok(AwsInfra {
        result: ClusterInfraResult {
            kubeconfig,
            db_endpoint,
            db_name: CLUSTER_DB_NAME.to_string(),
            component_identities,
        },
        node_role_arn: node_role.arn,
        zone_id: zone.id,
    })
}

/// Teardown, in dependency-reverse order.
pub async fn ensure_infra_absent(cfg: &ClusterConfig, apis: &AwsApis) -> Result<()> {
    let aws = cfg
        .aws
        .as_ref()
        .ok_or_else(|| Error::config_field("aws", "required for provider aws"))?;
    let name = cfg.cluster_name.clone();

    ensure_absent(&AutoscalingGroup {
        api: apis.autoscaling.clone(),
        cluster_name: name.clone(),
        group_name: format!("{name}-workers"),
        launch_configuration: format!("{name}-launch-config"),
        subnet_ids: vec![],
        desired_capacity: 0,
    })
    .await?;
    ensure_absent(&LaunchConfiguration {
        api: apis.autoscaling.clone(),
        config_name: format!("{name}-launch-config"),
        instance_type: String::new(),
        instance_profile_arn: String::new(),
        security_group_id: String::new(),
        user_data: String::new(),
    })
    .await?;
    ensure_absent(&InstanceProfile {
        api: apis.iam.clone(),
        profile_name: format!("{name}-nodes"),
    })
    .await?;

    let eks = EksCluster {
        api: apis.eks.clone(),
        cluster_name: name.clone(),
        spec: EksSpec {
            role_arn: String::new(),
            subnet_ids: vec![],
            security_group_ids: vec![],
            public_access_cidrs: vec![],
        },
    };
    let rds_pair = async {
        ensure_absent(&RdsInstance {
            api: apis.rds.clone(),
            db_instance_id: format!("{name}-db-0"),
            db_cluster_id: format!("{name}-db"),
            instance_class: String::new(),
        })
        .await?;
        ensure_absent(&RdsCluster {
            api: apis.rds.clone(),
            cluster_name: name.clone(),
            db_cluster_id: format!("{name}-db"),
            subnet_group: String::new(),
            security_group_id: String::new(),
        })
        .await
    };
    tokio::try_join!(ensure_absent(&eks), rds_pair)?;

    ensure_absent(&DbSubnetGroup {
        api: apis.rds.clone(),
        cluster_name: name.clone(),
        group_name: format!("{name}-db-subnets"),
        subnet_ids: vec![],
    })
    .await?;

    for group_name in [
        format!("{name}-db"),
        format!("{name}-worker"),
        format!("{name}-master"),
    ] {
        // The VPC may already be gone along with its groups.
        if let Some(vpc) = apis.ec2.find_vpc(&name).await? {
            ensure_absent(&SecurityGroup {
                api: apis.ec2.clone(),
                cluster_name: name.clone(),
                vpc_id: vpc.id,
                group_name,
                description: String::new(),
            })
            .await?;
        }
    }

    ensure_absent(&NatGateway {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        public_subnet_id: String::new(),
        allocation_id: String::new(),
    })
    .await?;
    ensure_absent(&ElasticIp {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
    })
    .await?;
    ensure_absent(&VpcEndpoint {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        vpc_id: String::new(),
        service_name: format!("com.amazonaws.{}.s3", aws.region),
        route_table_ids: vec![],
    })
    .await?;
    for table_name in [format!("{name}-public"), format!("{name}-private")] {
        ensure_absent(&RouteTable {
            api: apis.ec2.clone(),
            table_name,
            vpc_id: String::new(),
        })
        .await?;
    }
    if let Some(vpc) = apis.ec2.find_vpc(&name).await? {
        ensure_absent(&InternetGateway {
            api: apis.ec2.clone(),
            cluster_name: name.clone(),
            vpc_id: vpc.id.clone(),
        })
        .await?;
        ensure_absent(&SubnetSet {
            api: apis.ec2.clone(),
            cluster_name: name.clone(),
            vpc_id: vpc.id,
            specs: vec![],
        })
        .await?;
    }
    ensure_absent(&Vpc {
        api: apis.ec2.clone(),
        cluster_name: name.clone(),
        cidr_block: String::new(),
    })
    .await?;

    // IAM cleanup: detach known attachments, then delete.
    for (role, policy_arns) in [
        (
            format!("{name}-eks-controlplane"),
            vec![EKS_CLUSTER_POLICY_ARN.to_string(), EKS_SERVICE_POLICY_ARN.to_string()],
        ),
        (
            format!("{name}-eks-nodes"),
            vec![
                EKS_WORKER_POLICY_ARN.to_string(),
                EKS_CNI_POLICY_ARN.to_string(),
                ECR_READONLY_POLICY_ARN.to_string(),
            ],
        ),
    ] {
        for policy_arn in policy_arns {
            apis.iam.detach_role_policy(&role, &policy_arn).await?;
        }
    }
    for policy_name in [
        format!("{name}-externaldns"),
        format!("{name}-loki-s3"),
        format!("{name}-cortex-s3"),
    ] {
        if let Some(policy) = apis.iam.find_policy(&policy_name).await? {
            for role in [
                format!("{name}-eks-nodes"),
                format!("{name}-cert-manager"),
            ] {
                apis.iam.detach_role_policy(&role, &policy.arn).await?;
            }
            apis.iam.delete_policy(&policy.arn).await?;
        }
    }
    for role_name in [
        format!("{name}-eks-controlplane"),
        format!("{name}-eks-nodes"),
        format!("{name}-cert-manager"),
    ] {
        apis.iam.delete_role(&role_name).await?;
    }

    for bucket_name in [cfg.bucket_name("loki"), cfg.bucket_name("cortex")] {
        ensure_absent(&S3Bucket {
            api: apis.s3.clone(),
            cluster_name: name.clone(),
            bucket_name,
            region: aws.region.clone(),
            retention_days: 0,
        })
        .await?;
    }

    ensure_absent(&HostedZone {
        api: apis.route53.clone(),
        cluster_name: name.clone(),
        dns_name: cfg.dns_name.clone(),
    })
    .await?;

    info!(cluster = %name, "AWS infrastructure removed");
    Ok(())
}

// Re-exported so the platform layer can wait on DNS convergence without
// reaching into groundwork-aws directly.
pub use groundwork_aws::route53::wait_for_tenant_records;
