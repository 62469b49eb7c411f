//! End-to-end AWS orchestration against an in-memory provider
//!
//! The fake keeps real state: a create mutates it, an observe reads it
//! back, so the orchestrator runs its actual reconcile loops. The second
//! run must find everything in place and issue no creates at all.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use groundwork_aws::api::*;
use groundwork_cloud::{CreateOutcome, DeleteOutcome};
use groundwork_common::{AwsConfig, CloudProvider, ClusterConfig, Result};
use groundwork_installer::aws::ensure_infra_exists;
use groundwork_installer::AwsApis;

#[derive(Default)]
struct State {
    vpc: Option<VpcDesc>,
    subnets: Vec<SubnetDesc>,
    igw: Option<InternetGatewayDesc>,
    address: Option<AddressDesc>,
    nat: Option<NatGatewayDesc>,
    route_tables: BTreeMap<String, RouteTableDesc>,
    endpoint: Option<VpcEndpointDesc>,
    security_groups: BTreeMap<String, SecurityGroupDesc>,
    roles: BTreeMap<String, RoleDesc>,
    policies: BTreeMap<String, PolicyDesc>,
    profiles: BTreeMap<String, InstanceProfileDesc>,
    buckets: Vec<String>,
    eks: Option<EksDesc>,
    subnet_group: Option<String>,
    db_cluster: Option<DbClusterDesc>,
    db_instance: Option<DbInstanceDesc>,
    zone: Option<HostedZoneDesc>,
    launch_config: Option<String>,
    asg: Option<AsgDesc>,
    /// Create calls, keyed by method name
    creates: BTreeMap<&'static str, u32>,
}

#[derive(Default)]
struct FakeAws {
    state: Mutex<State>,
}

impl FakeAws {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    fn created(&self, method: &'static str) {
        self.with(|s| *s.creates.entry(method).or_insert(0) += 1);
    }

    fn create_counts(&self) -> BTreeMap<&'static str, u32> {
        self.with(|s| s.creates.clone())
    }
}

#[async_trait]
impl Ec2Api for FakeAws {
    async fn find_vpc(&self, _cluster_name: &str) -> Result<Option<VpcDesc>> {
        Ok(self.with(|s| s.vpc.clone()))
    }

    async fn create_vpc(&self, _cluster_name: &str, cidr_block: &str) -> Result<CreateOutcome> {
        self.created("create_vpc");
        self.with(|s| {
            s.vpc = Some(VpcDesc {
                id: "vpc-1".to_string(),
                state: "available".to_string(),
                cidr_block: cidr_block.to_string(),
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_vpc(&self, _vpc_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.vpc.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn list_subnets(&self, _cluster_name: &str) -> Result<Vec<SubnetDesc>> {
        Ok(self.with(|s| s.subnets.clone()))
    }

    async fn create_subnet(
        &self,
        _cluster_name: &str,
        _vpc_id: &str,
        spec: &SubnetSpec,
    ) -> Result<CreateOutcome> {
        self.created("create_subnet");
        let spec = spec.clone();
        self.with(|s| {
            let id = format!("subnet-{}", s.subnets.len());
            s.subnets.push(SubnetDesc {
                id,
                state: "available".to_string(),
                cidr_block: spec.cidr_block,
                availability_zone: spec.availability_zone,
                public: spec.public,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<DeleteOutcome> {
        let found = self.with(|s| {
            let before = s.subnets.len();
            s.subnets.retain(|sub| sub.id != subnet_id);
            s.subnets.len() != before
        });
        Ok(if found {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn find_internet_gateway(
        &self,
        _cluster_name: &str,
    ) -> Result<Option<InternetGatewayDesc>> {
        Ok(self.with(|s| s.igw.clone()))
    }

    async fn create_internet_gateway(&self, _cluster_name: &str) -> Result<CreateOutcome> {
        self.created("create_internet_gateway");
        self.with(|s| {
            s.igw = Some(InternetGatewayDesc {
                id: "igw-1".to_string(),
                attached_vpc: None,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn attach_internet_gateway(&self, _igw_id: &str, vpc_id: &str) -> Result<()> {
        let vpc_id = vpc_id.to_string();
        self.with(|s| {
            if let Some(igw) = s.igw.as_mut() {
                igw.attached_vpc = Some(vpc_id);
            }
        });
        Ok(())
    }

    async fn detach_internet_gateway(&self, _igw_id: &str, _vpc_id: &str) -> Result<()> {
        self.with(|s| {
            if let Some(igw) = s.igw.as_mut() {
                igw.attached_vpc = None;
            }
        });
        Ok(())
    }

    async fn delete_internet_gateway(&self, _igw_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.igw.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn find_address(&self, _cluster_name: &str) -> Result<Option<AddressDesc>> {
        Ok(self.with(|s| s.address.clone()))
    }

    async fn allocate_address(&self, _cluster_name: &str) -> Result<CreateOutcome> {
        self.created("allocate_address");
        self.with(|s| {
            s.address = Some(AddressDesc {
                allocation_id: "eipalloc-1".to_string(),
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn release_address(&self, _allocation_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.address.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn find_nat_gateway(&self, _cluster_name: &str) -> Result<Option<NatGatewayDesc>> {
        Ok(self.with(|s| s.nat.clone()))
    }

    async fn create_nat_gateway(
        &self,
        _cluster_name: &str,
        _subnet_id: &str,
        _allocation_id: &str,
    ) -> Result<CreateOutcome> {
        self.created("create_nat_gateway");
        self.with(|s| {
            s.nat = Some(NatGatewayDesc {
                id: "nat-1".to_string(),
                state: "available".to_string(),
                failure_detail: None,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_nat_gateway(&self, _nat_gateway_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.nat.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn find_route_table(&self, name: &str) -> Result<Option<RouteTableDesc>> {
        Ok(self.with(|s| s.route_tables.get(name).cloned()))
    }

    async fn create_route_table(&self, name: &str, _vpc_id: &str) -> Result<CreateOutcome> {
        self.created("create_route_table");
        let name = name.to_string();
        self.with(|s| {
            let id = format!("rtb-{}", s.route_tables.len());
            s.route_tables.insert(
                name,
                RouteTableDesc {
                    id,
                    associated_subnet_ids: vec![],
                },
            )
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_route_table(&self, route_table_id: &str) -> Result<DeleteOutcome> {
        let found = self.with(|s| {
            let before = s.route_tables.len();
            s.route_tables.retain(|_, t| t.id != route_table_id);
            s.route_tables.len() != before
        });
        Ok(if found {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn ensure_route(
        &self,
        _route_table_id: &str,
        _destination_cidr: &str,
        _target: &RouteTarget,
    ) -> Result<()> {
        Ok(())
    }

    async fn associate_route_table(&self, route_table_id: &str, subnet_id: &str) -> Result<()> {
        let subnet_id = subnet_id.to_string();
        self.with(|s| {
            for table in s.route_tables.values_mut() {
                if table.id == route_table_id && !table.associated_subnet_ids.contains(&subnet_id)
                {
                    table.associated_subnet_ids.push(subnet_id.clone());
                }
            }
        });
        Ok(())
    }

    async fn find_vpc_endpoint(&self, _cluster_name: &str) -> Result<Option<VpcEndpointDesc>> {
        Ok(self.with(|s| s.endpoint.clone()))
    }

    async fn create_vpc_endpoint(
        &self,
        _cluster_name: &str,
        _vpc_id: &str,
        _service_name: &str,
        _route_table_ids: &[String],
    ) -> Result<CreateOutcome> {
        self.created("create_vpc_endpoint");
        self.with(|s| {
            s.endpoint = Some(VpcEndpointDesc {
                id: "vpce-1".to_string(),
                state: "available".to_string(),
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_vpc_endpoint(&self, _endpoint_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.endpoint.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn find_security_group(
        &self,
        _vpc_id: &str,
        group_name: &str,
    ) -> Result<Option<SecurityGroupDesc>> {
        Ok(self.with(|s| s.security_groups.get(group_name).cloned()))
    }

    async fn create_security_group(
        &self,
        _cluster_name: &str,
        _vpc_id: &str,
        group_name: &str,
        _description: &str,
    ) -> Result<CreateOutcome> {
        self.created("create_security_group");
        let group_name = group_name.to_string();
        self.with(|s| {
            let id = format!("sg-{}", s.security_groups.len());
            s.security_groups.insert(
                group_name.clone(),
                SecurityGroupDesc {
                    id,
                    group_name,
                },
            )
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<DeleteOutcome> {
        let found = self.with(|s| {
            let before = s.security_groups.len();
            s.security_groups.retain(|_, g| g.id != group_id);
            s.security_groups.len() != before
        });
        Ok(if found {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn authorize_ingress(&self, _group_id: &str, _rule: &SecurityGroupRule) -> Result<()> {
        Ok(())
    }

    async fn authorize_egress(&self, _group_id: &str, _rule: &SecurityGroupRule) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl IamApi for FakeAws {
    async fn find_role(&self, name: &str) -> Result<Option<RoleDesc>> {
        Ok(self.with(|s| s.roles.get(name).cloned()))
    }

    async fn create_role(
        &self,
        name: &str,
        _assume_role_policy: &serde_json::Value,
    ) -> Result<CreateOutcome> {
        self.created("create_role");
        let name = name.to_string();
        self.with(|s| {
            s.roles.insert(
                name.clone(),
                RoleDesc {
                    arn: format!("arn:aws:iam::123456789012:role/{name}"),
                    name,
                },
            )
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_role(&self, name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.roles.remove(name)) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn find_policy(&self, name: &str) -> Result<Option<PolicyDesc>> {
        Ok(self.with(|s| s.policies.get(name).cloned()))
    }

    async fn create_policy(
        &self,
        name: &str,
        _document: &serde_json::Value,
    ) -> Result<CreateOutcome> {
        self.created("create_policy");
        let name = name.to_string();
        self.with(|s| {
            s.policies.insert(
                name.clone(),
                PolicyDesc {
                    arn: format!("arn:aws:iam::123456789012:policy/{name}"),
                    name,
                },
            )
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_policy(&self, arn: &str) -> Result<DeleteOutcome> {
        let found = self.with(|s| {
            let before = s.policies.len();
            s.policies.retain(|_, p| p.arn != arn);
            s.policies.len() != before
        });
        Ok(if found {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn attach_role_policy(&self, _role_name: &str, _policy_arn: &str) -> Result<()> {
        Ok(())
    }

    async fn detach_role_policy(&self, _role_name: &str, _policy_arn: &str) -> Result<()> {
        Ok(())
    }

    async fn find_instance_profile(&self, name: &str) -> Result<Option<InstanceProfileDesc>> {
        Ok(self.with(|s| s.profiles.get(name).cloned()))
    }

    async fn create_instance_profile(&self, name: &str) -> Result<CreateOutcome> {
        self.created("create_instance_profile");
        let name = name.to_string();
        self.with(|s| {
            s.profiles.insert(
                name.clone(),
                InstanceProfileDesc {
                    arn: format!("arn:aws:iam::123456789012:instance-profile/{name}"),
                    name,
                    role_names: vec![],
                },
            )
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_instance_profile(&self, name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.profiles.remove(name)) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn add_role_to_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<()> {
        let role_name = role_name.to_string();
        self.with(|s| {
            if let Some(profile) = s.profiles.get_mut(profile_name) {
                if !profile.role_names.contains(&role_name) {
                    profile.role_names.push(role_name);
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl S3Api for FakeAws {
    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with(|s| s.buckets.iter().any(|b| b == name)))
    }

    async fn create_bucket(&self, name: &str, _region: &str) -> Result<CreateOutcome> {
        self.created("create_bucket");
        let name = name.to_string();
        self.with(|s| s.buckets.push(name));
        Ok(CreateOutcome::Created)
    }

    async fn put_bucket_lifecycle(&self, _name: &str, _expiration_days: u32) -> Result<()> {
        Ok(())
    }

    async fn put_bucket_tagging(&self, _name: &str, _cluster_name: &str) -> Result<()> {
        Ok(())
    }

    async fn delete_bucket(&self, name: &str) -> Result<DeleteOutcome> {
        let found = self.with(|s| {
            let before = s.buckets.len();
            s.buckets.retain(|b| b != name);
            s.buckets.len() != before
        });
        Ok(if found {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}

#[async_trait]
impl EksApi for FakeAws {
    async fn describe_cluster(&self, _name: &str) -> Result<Option<EksDesc>> {
        Ok(self.with(|s| s.eks.clone()))
    }

    async fn create_cluster(&self, name: &str, _spec: &EksSpec) -> Result<CreateOutcome> {
        self.created("create_eks_cluster");
        let name = name.to_string();
        self.with(|s| {
            s.eks = Some(EksDesc {
                name,
                status: "ACTIVE".to_string(),
                endpoint: Some("https://eks.internal.example".to_string()),
                certificate_authority_data: Some("Y2EtZGF0YQ==".to_string()),
                failure_detail: None,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_cluster(&self, _name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.eks.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}

#[async_trait]
impl RdsApi for FakeAws {
    async fn subnet_group_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with(|s| s.subnet_group.as_deref() == Some(name)))
    }

    async fn create_subnet_group(
        &self,
        name: &str,
        _cluster_name: &str,
        _subnet_ids: &[String],
    ) -> Result<CreateOutcome> {
        self.created("create_subnet_group");
        let name = name.to_string();
        self.with(|s| s.subnet_group = Some(name));
        Ok(CreateOutcome::Created)
    }

    async fn delete_subnet_group(&self, _name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.subnet_group.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn describe_db_cluster(&self, _id: &str) -> Result<Option<DbClusterDesc>> {
        Ok(self.with(|s| s.db_cluster.clone()))
    }

    async fn create_db_cluster(
        &self,
        id: &str,
        _cluster_name: &str,
        _subnet_group: &str,
        _security_group_id: &str,
    ) -> Result<CreateOutcome> {
        self.created("create_db_cluster");
        let id = id.to_string();
        self.with(|s| {
            s.db_cluster = Some(DbClusterDesc {
                id,
                status: "available".to_string(),
                endpoint: Some("db.cluster.internal.example".to_string()),
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_db_cluster(&self, _id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.db_cluster.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn describe_db_instance(&self, _id: &str) -> Result<Option<DbInstanceDesc>> {
        Ok(self.with(|s| s.db_instance.clone()))
    }

    async fn create_db_instance(
        &self,
        id: &str,
        _db_cluster_id: &str,
        _instance_class: &str,
    ) -> Result<CreateOutcome> {
        self.created("create_db_instance");
        let id = id.to_string();
        self.with(|s| {
            s.db_instance = Some(DbInstanceDesc {
                id,
                status: "available".to_string(),
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_db_instance(&self, _id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.db_instance.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}

#[async_trait]
impl Route53Api for FakeAws {
    async fn find_zone(&self, _dns_name: &str) -> Result<Option<HostedZoneDesc>> {
        Ok(self.with(|s| s.zone.clone()))
    }

    async fn create_zone(&self, dns_name: &str, _cluster_name: &str) -> Result<CreateOutcome> {
        self.created("create_zone");
        let dns_name = dns_name.to_string();
        self.with(|s| {
            s.zone = Some(HostedZoneDesc {
                id: "Z123".to_string(),
                name: dns_name,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_zone(&self, _zone_id: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.zone.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn list_records(&self, _zone_id: &str) -> Result<Vec<RecordDesc>> {
        Ok(vec![])
    }
}

#[async_trait]
impl StsApi for FakeAws {
    async fn get_account_id(&self) -> Result<String> {
        Ok("123456789012".to_string())
    }
}

#[async_trait]
impl AutoscalingApi for FakeAws {
    async fn launch_configuration_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with(|s| s.launch_config.as_deref() == Some(name)))
    }

    async fn create_launch_configuration(
        &self,
        name: &str,
        _instance_type: &str,
        _instance_profile_arn: &str,
        _security_group_id: &str,
        _user_data: &str,
    ) -> Result<CreateOutcome> {
        self.created("create_launch_configuration");
        let name = name.to_string();
        self.with(|s| s.launch_config = Some(name));
        Ok(CreateOutcome::Created)
    }

    async fn delete_launch_configuration(&self, _name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.launch_config.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn describe_autoscaling_group(&self, _name: &str) -> Result<Option<AsgDesc>> {
        Ok(self.with(|s| s.asg.clone()))
    }

    async fn create_autoscaling_group(
        &self,
        name: &str,
        _cluster_name: &str,
        _launch_configuration: &str,
        _subnet_ids: &[String],
        desired_capacity: u32,
    ) -> Result<CreateOutcome> {
        self.created("create_autoscaling_group");
        let name = name.to_string();
        self.with(|s| {
            s.asg = Some(AsgDesc {
                name,
                desired_capacity,
            })
        });
        Ok(CreateOutcome::Created)
    }

    async fn delete_autoscaling_group(&self, _name: &str) -> Result<DeleteOutcome> {
        Ok(match self.with(|s| s.asg.take()) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}

fn apis(fake: &Arc<FakeAws>) -> AwsApis {
    AwsApis {
        ec2: fake.clone(),
        iam: fake.clone(),
        s3: fake.clone(),
        eks: fake.clone(),
        rds: fake.clone(),
        route53: fake.clone(),
        sts: fake.clone(),
        autoscaling: fake.clone(),
    }
}

fn config() -> ClusterConfig {
    ClusterConfig {
        cluster_name: "dev".to_string(),
        cloud_provider: CloudProvider::Aws,
        node_count: 3,
        tenants: vec!["default".to_string()],
        log_retention_days: 7,
        metric_retention_days: 30,
        controller_image: "groundwork/controller:latest".to_string(),
        dns_name: "dev.groundwork.example.".to_string(),
        authorized_networks: vec!["0.0.0.0/0".to_string()],
        aws: Some(AwsConfig {
            region: "us-west-2".to_string(),
            zone_suffix: "a".to_string(),
            instance_type: "t3.xlarge".to_string(),
            eks_admin_roles: vec![],
        }),
        gcp: None,
    }
}

#[tokio::test(start_paused = true)]
async fn full_graph_provisions_once() {
    let fake = Arc::new(FakeAws::default());
    let infra = ensure_infra_exists(&config(), &apis(&fake)).await.unwrap();

    assert!(infra.result.kubeconfig.contains("https://eks.internal.example"));
    assert_eq!(infra.result.db_endpoint, "db.cluster.internal.example");
    assert_eq!(infra.result.db_name, "groundwork");
    assert!(infra.result.component_identities.contains_key("cert-manager"));
    assert!(infra.node_role_arn.ends_with("role/dev-eks-nodes"));
    assert_eq!(infra.zone_id, "Z123");

    let counts = fake.create_counts();
    assert_eq!(counts["create_vpc"], 1);
    assert_eq!(counts["create_subnet"], 4);
    assert_eq!(counts["create_internet_gateway"], 1);
    assert_eq!(counts["create_nat_gateway"], 1);
    assert_eq!(counts["create_route_table"], 2);
    assert_eq!(counts["create_security_group"], 3);
    assert_eq!(counts["create_role"], 3);
    assert_eq!(counts["create_policy"], 3);
    assert_eq!(counts["create_bucket"], 2);
    assert_eq!(counts["create_eks_cluster"], 1);
    assert_eq!(counts["create_db_cluster"], 1);
    assert_eq!(counts["create_db_instance"], 1);
    assert_eq!(counts["create_zone"], 1);
    assert_eq!(counts["create_autoscaling_group"], 1);
}

#[tokio::test(start_paused = true)]
async fn second_run_adopts_everything_without_creates() {
    let fake = Arc::new(FakeAws::default());
    let api_bundle = apis(&fake);

    let first = ensure_infra_exists(&config(), &api_bundle).await.unwrap();
    let counts_after_first = fake.create_counts();

    let second = ensure_infra_exists(&config(), &api_bundle).await.unwrap();
    let counts_after_second = fake.create_counts();

    assert_eq!(counts_after_first, counts_after_second);
    assert_eq!(first.result.db_endpoint, second.result.db_endpoint);
    assert_eq!(first.result.kubeconfig, second.result.kubeconfig);
}
