//! [`TemplateCompiler`]: renders descriptors into a stack template.
//!
//! Logical ids are derived from the scope path below the stack root, keeping
//! only ASCII alphanumerics, followed by a per-kind suffix. A path with no
//! alphanumerics has no id. Each id, deployed function name and export name
//! may be used once per stack.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};
use stratus_core::DeploymentTarget;
use stratus_function::{
    CompilerError, ExportValue, FunctionDescriptor, FunctionHandle, NetworkPlacement,
    RemovalPolicy, ResourceAttribute, ResourceGraphCompiler, Scope, SubnetSelection,
};
use stratus_pipeline::{WorkflowCompiler, WorkflowDefinition, WorkflowHandle};
use stratus_policy::{ExecutionRole, LayerRef, PolicyStatement, SecretRef};

use crate::template::{
    ExportName, Output, Parameter, Resource, Template, export_value, get_att, reference,
    sub_if_needed,
};

pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const LOG_GROUP: &str = "AWS::Logs::LogGroup";
pub const SECRET: &str = "AWS::SecretsManager::Secret";
pub const STATE_MACHINE: &str = "AWS::StepFunctions::StateMachine";

/// Principal assumed by workflow execution roles.
pub const STATES_SERVICE_PRINCIPAL: &str = "states.amazonaws.com";

/// Bucket the deployment engine uploads function packages to.
pub const ASSET_BUCKET: &str = "stratus-assets-${AWS::AccountId}-${AWS::Region}";

/// Template metadata key holding the account and region a stack targets.
pub const TARGET_METADATA_KEY: &str = "Stratus::Target";

/// Logical id for `scope` with `suffix` appended.
///
/// Fails when the scope path keeps no characters once filtered.
pub fn logical_id(scope: &Scope, suffix: &str) -> Result<String, CompilerError> {
    let path = scope.path();
    let parts = if path.len() > 1 { &path[1..] } else { path };
    let mut id: String = parts
        .iter()
        .flat_map(|p| p.chars())
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if id.is_empty() {
        return Err(CompilerError::InvalidReference(format!(
            "scope '{}' yields an empty logical id",
            scope
        )));
    }
    id.push_str(suffix);
    Ok(id)
}

/// Compiles descriptors for one stack.
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    stack_name: String,
    tags: BTreeMap<String, String>,
    template: Template,
    function_names: BTreeSet<String>,
    export_names: BTreeSet<String>,
}

impl TemplateCompiler {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            tags: BTreeMap::new(),
            template: Template::new(),
            function_names: BTreeSet::new(),
            export_names: BTreeSet::new(),
        }
    }

    /// Tags applied to every taggable resource.
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.template.description = Some(description.into());
        self
    }

    /// Record the target account and region in the template metadata.
    ///
    /// Unset values are left out. Nothing is recorded when both are unset.
    pub fn with_target(mut self, target: &DeploymentTarget) -> Self {
        let mut recorded = Map::new();
        if let Some(account) = &target.account {
            recorded.insert("Account".into(), json!(account));
        }
        if let Some(region) = &target.region {
            recorded.insert("Region".into(), json!(region));
        }
        if !recorded.is_empty() {
            self.template.metadata = Some(json!({ TARGET_METADATA_KEY: recorded }));
        }
        self
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Scope of the stack itself.
    pub fn scope(&self) -> Scope {
        Scope::root(self.stack_name.clone())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn into_template(self) -> Template {
        tracing::info!(
            stack = %self.stack_name,
            resources = self.template.resources.len(),
            outputs = self.template.outputs.len(),
            "Synthesized stack"
        );
        self.template
    }

    fn add_resource(
        &mut self,
        logical_id: String,
        resource: Resource,
    ) -> Result<(), CompilerError> {
        if self.template.resources.contains_key(&logical_id) {
            return Err(CompilerError::DuplicateLogicalId(logical_id));
        }
        tracing::debug!(
            logical_id = %logical_id,
            kind = %resource.resource_type,
            "Adding resource"
        );
        self.template.resources.insert(logical_id, resource);
        Ok(())
    }

    fn tag_list(&self) -> Value {
        Value::Array(
            self.tags
                .iter()
                .map(|(k, v)| json!({ "Key": k, "Value": v }))
                .collect(),
        )
    }

    fn role_resource(&self, role: &ExecutionRole, policy_name: &str) -> Resource {
        let managed: Vec<&str> = role.managed_policies.iter().map(|p| p.arn()).collect();
        Resource::new(
            IAM_ROLE,
            json!({
                "AssumeRolePolicyDocument": assume_role_document(&role.assumed_by),
                "ManagedPolicyArns": managed,
                "Policies": [{
                    "PolicyName": policy_name,
                    "PolicyDocument": policy_document(&role.statements),
                }],
                "Tags": self.tag_list(),
            }),
        )
    }

    fn vpc_config(&mut self, network: &NetworkPlacement) -> Value {
        let security_groups: Vec<&str> = network
            .security_groups
            .iter()
            .map(|g| g.group_id.as_str())
            .collect();

        let subnets = match &network.subnets {
            SubnetSelection::Subnets(ids) => json!(ids),
            selection => {
                // Subnets selected by type are supplied at deploy time.
                let kind = selection.subnet_type().unwrap_or("PRIVATE_WITH_EGRESS");
                let name = parameter_name(&network.vpc.vpc_id, kind);
                self.template.parameters.entry(name.clone()).or_insert(Parameter {
                    parameter_type: "List<AWS::EC2::Subnet::Id>".to_string(),
                    description: Some(format!("{} subnets of {}", kind, network.vpc.vpc_id)),
                });
                reference(&name)
            }
        };

        json!({
            "SecurityGroupIds": security_groups,
            "SubnetIds": subnets,
        })
    }
}

impl ResourceGraphCompiler for TemplateCompiler {
    fn materialize_function(
        &mut self,
        descriptor: &FunctionDescriptor,
    ) -> Result<FunctionHandle, CompilerError> {
        if self.function_names.contains(&descriptor.function_name) {
            return Err(CompilerError::DuplicateFunction(descriptor.function_name.clone()));
        }

        let function_id = logical_id(&descriptor.scope, "Function")?;
        let role_id = logical_id(&descriptor.scope, "Role")?;
        let log_group_id = logical_id(&descriptor.scope, "LogGroup")?;
        for id in [&function_id, &role_id, &log_group_id] {
            if self.template.resources.contains_key(id) {
                return Err(CompilerError::DuplicateLogicalId(id.clone()));
            }
        }

        let policy_name = logical_id(&descriptor.scope, "DefaultPolicy")?;
        let role = self.role_resource(&descriptor.role, &policy_name);
        self.add_resource(role_id.clone(), role)?;

        let mut properties = Map::new();
        properties.insert("FunctionName".into(), json!(descriptor.function_name));
        properties.insert("Runtime".into(), json!(descriptor.runtime.name()));
        properties.insert("Handler".into(), json!(descriptor.source.handler()));
        properties.insert("Architectures".into(), json!([descriptor.architecture.as_str()]));
        properties.insert(
            "Role".into(),
            get_att(&ResourceAttribute::new(role_id.clone(), "Arn")),
        );
        properties.insert(
            "Code".into(),
            json!({
                "S3Bucket": { "Fn::Sub": ASSET_BUCKET },
                "S3Key": format!("{}.zip", descriptor.function_name),
            }),
        );

        if let Some(timeout) = descriptor.limits.timeout {
            properties.insert("Timeout".into(), json!(timeout.as_secs()));
        }
        if let Some(memory) = descriptor.limits.memory_size {
            properties.insert("MemorySize".into(), json!(memory));
        }
        if let Some(concurrency) = descriptor.limits.reserved_concurrency {
            properties.insert("ReservedConcurrentExecutions".into(), json!(concurrency));
        }
        if !descriptor.environment_variables.is_empty() {
            properties.insert(
                "Environment".into(),
                json!({ "Variables": descriptor.environment_variables }),
            );
        }
        if !descriptor.layers.is_empty() {
            let layers: Vec<&str> = descriptor.layers.iter().map(|l| l.arn()).collect();
            properties.insert("Layers".into(), json!(layers));
        }
        if let Some(network) = &descriptor.network {
            let config = self.vpc_config(network);
            properties.insert("VpcConfig".into(), config);
        }

        let mut log_group_dependency = None;
        if let Some(log_group) = &descriptor.log_group {
            let policy = match log_group.removal_policy {
                RemovalPolicy::Destroy => "Delete",
                RemovalPolicy::Retain => "Retain",
            };
            let resource = Resource::new(
                LOG_GROUP,
                json!({
                    "LogGroupName": log_group.name,
                    "RetentionInDays": log_group.retention_days,
                    "Tags": self.tag_list(),
                }),
            )
            .with_deletion_policy(policy);
            self.add_resource(log_group_id.clone(), resource)?;

            properties.insert(
                "LoggingConfig".into(),
                json!({ "LogGroup": reference(&log_group_id) }),
            );
            log_group_dependency = Some(log_group_id);
        }
        properties.insert("Tags".into(), self.tag_list());

        let mut resource = Resource::new(LAMBDA_FUNCTION, Value::Object(properties))
            .depends_on(role_id)
            .with_metadata(json!({
                "aws:asset:path": descriptor.source.code_path().display().to_string(),
                "stratus:scope": descriptor.scope.to_string(),
            }));
        if let Some(log_group_id) = log_group_dependency {
            resource = resource.depends_on(log_group_id);
        }
        self.add_resource(function_id.clone(), resource)?;
        self.function_names.insert(descriptor.function_name.clone());

        tracing::debug!(
            function = %descriptor.function_name,
            logical_id = %function_id,
            "Materialized function"
        );

        Ok(FunctionHandle {
            function_name: descriptor.function_name.clone(),
            function_arn: ResourceAttribute::new(function_id, "Arn"),
        })
    }

    fn declare_secret(
        &mut self,
        scope: &Scope,
        secret_name: &str,
    ) -> Result<SecretRef, CompilerError> {
        let id = logical_id(scope, "")?;
        let resource = Resource::new(
            SECRET,
            json!({
                "Name": secret_name,
                "GenerateSecretString": {},
                "Tags": self.tag_list(),
            }),
        )
        .with_deletion_policy("Delete");
        self.add_resource(id, resource)?;
        Ok(SecretRef::named(secret_name))
    }

    fn import_layer(&mut self, scope: &Scope, arn: &str) -> Result<LayerRef, CompilerError> {
        let layer = LayerRef::from_arn(arn)
            .map_err(|e| CompilerError::InvalidReference(e.to_string()))?;
        tracing::debug!(scope = %scope, arn, "Imported layer");
        Ok(layer)
    }

    fn export(
        &mut self,
        scope: &Scope,
        export_name: &str,
        value: ExportValue,
    ) -> Result<(), CompilerError> {
        if let ExportValue::Attribute(attribute) = &value {
            if !self.template.resources.contains_key(&attribute.logical_id) {
                return Err(CompilerError::UnknownResource(attribute.logical_id.clone()));
            }
        }
        if self.export_names.contains(export_name) {
            return Err(CompilerError::DuplicateExport(export_name.to_string()));
        }

        let id = logical_id(scope, "")?;
        if self.template.outputs.contains_key(&id) {
            return Err(CompilerError::DuplicateLogicalId(id));
        }

        self.template.outputs.insert(
            id,
            Output {
                value: export_value(&value),
                export: Some(ExportName {
                    name: export_name.to_string(),
                }),
            },
        );
        self.export_names.insert(export_name.to_string());
        Ok(())
    }
}

impl WorkflowCompiler for TemplateCompiler {
    fn materialize_workflow(
        &mut self,
        scope: &Scope,
        definition: &WorkflowDefinition,
    ) -> Result<WorkflowHandle, CompilerError> {
        for function in definition.functions() {
            if !self.template.resources.contains_key(&function.function_arn.logical_id) {
                return Err(CompilerError::UnknownResource(
                    function.function_arn.logical_id.clone(),
                ));
            }
        }

        let role_id = logical_id(scope, "Role")?;
        let machine_id = logical_id(scope, "StateMachine")?;
        let policy_name = logical_id(scope, "DefaultPolicy")?;

        let mut invoke_resources = Vec::new();
        for function in definition.functions() {
            invoke_resources.push(get_att(&function.function_arn));
            invoke_resources.push(json!({
                "Fn::Join": ["", [get_att(&function.function_arn), ":*"]]
            }));
        }
        let role = Resource::new(
            IAM_ROLE,
            json!({
                "AssumeRolePolicyDocument": assume_role_document(STATES_SERVICE_PRINCIPAL),
                "Policies": [{
                    "PolicyName": policy_name,
                    "PolicyDocument": {
                        "Version": stratus_policy::statement::POLICY_VERSION,
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": ["lambda:InvokeFunction"],
                            "Resource": invoke_resources,
                        }],
                    },
                }],
                "Tags": self.tag_list(),
            }),
        );
        self.add_resource(role_id.clone(), role)?;

        let definition_string = serde_json::to_string(&definition.to_states_json())
            .map_err(|e| CompilerError::InvalidReference(e.to_string()))?;
        let substitutions: Map<String, Value> = definition
            .substitutions()
            .into_iter()
            .map(|(k, attribute)| (k, get_att(attribute)))
            .collect();

        let machine = Resource::new(
            STATE_MACHINE,
            json!({
                "StateMachineName": definition.name,
                "DefinitionString": definition_string,
                "DefinitionSubstitutions": substitutions,
                "RoleArn": get_att(&ResourceAttribute::new(role_id.clone(), "Arn")),
                "Tags": self.tag_list(),
            }),
        )
        .depends_on(role_id);
        self.add_resource(machine_id.clone(), machine)?;

        tracing::debug!(
            workflow = %definition.name,
            logical_id = %machine_id,
            "Materialized workflow"
        );

        Ok(WorkflowHandle {
            state_machine_name: definition.name.clone(),
            state_machine_arn: ResourceAttribute::new(machine_id, "Arn"),
        })
    }
}

fn assume_role_document(service: &str) -> Value {
    json!({
        "Version": stratus_policy::statement::POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole",
        }],
    })
}

fn policy_document(statements: &[PolicyStatement]) -> Value {
    let statements: Vec<Value> = statements
        .iter()
        .map(|s| {
            let resources: Vec<Value> = s.resources.iter().map(|r| sub_if_needed(r)).collect();
            json!({
                "Effect": s.effect,
                "Action": s.actions,
                "Resource": resources,
            })
        })
        .collect();

    json!({
        "Version": stratus_policy::statement::POLICY_VERSION,
        "Statement": statements,
    })
}

fn parameter_name(vpc_id: &str, subnet_type: &str) -> String {
    let mut name: String = vpc_id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    for word in subnet_type.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    name.push_str("Subnets");
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use stratus_core::{Environment, EnvironmentName, Region};
    use stratus_function::{
        BuildError, FunctionProps, PythonFunctionBuilder, SecurityGroupRef, VpcRef,
    };
    use stratus_policy::ManagedPolicyRef;

    fn env() -> Environment {
        Environment::new("Acme", "kb", EnvironmentName::Dev, Region::UsEast1)
    }

    #[test]
    fn test_logical_id() {
        let scope = Scope::root("Stack").child("Builder-Simple").child("Python_Lambda");
        assert_eq!(
            logical_id(&scope, "Function").unwrap(),
            "BuilderSimplePythonLambdaFunction"
        );
        assert_eq!(logical_id(&Scope::root("Secret"), "").unwrap(), "Secret");
        assert!(matches!(
            logical_id(&Scope::root("Stack").child("--"), "Function"),
            Err(CompilerError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_punctuation_scope_is_rejected() {
        let mut compiler = TemplateCompiler::new("Stack");
        let err = compiler
            .declare_secret(&compiler.scope().child("--"), "acme-kb-dev-secret")
            .unwrap_err();
        assert!(matches!(err, CompilerError::InvalidReference(_)));
        assert!(compiler.template().resources.is_empty());

        let scope = compiler.scope().child("__");
        let err = PythonFunctionBuilder::new(scope, FunctionProps::new("f", &env()))
            .build(&mut compiler)
            .unwrap_err();
        assert!(matches!(err, BuildError::Compiler(CompilerError::InvalidReference(_))));
    }

    #[test]
    fn test_target_recorded_in_metadata() {
        let target = DeploymentTarget {
            account: Some("111111111111".to_string()),
            region: Some("us-west-2".to_string()),
            owner: None,
        };
        let template = TemplateCompiler::new("Stack").with_target(&target).into_template();
        let value = template.to_value().unwrap();
        assert_eq!(
            value["Metadata"][TARGET_METADATA_KEY],
            json!({ "Account": "111111111111", "Region": "us-west-2" })
        );

        let region_only = DeploymentTarget {
            region: Some("us-east-1".to_string()),
            ..Default::default()
        };
        let template = TemplateCompiler::new("Stack").with_target(&region_only).into_template();
        assert_eq!(
            template.metadata,
            Some(json!({ TARGET_METADATA_KEY: { "Region": "us-east-1" } }))
        );

        let template = TemplateCompiler::new("Stack")
            .with_target(&DeploymentTarget::default())
            .into_template();
        assert!(template.to_value().unwrap().get("Metadata").is_none());
    }

    #[test]
    fn test_function_resources() {
        let mut compiler = TemplateCompiler::new("Stack");
        let scope = compiler.scope().child("Ingest");
        let handle = PythonFunctionBuilder::new(scope, FunctionProps::new("ingest", &env()))
            .with_log_group()
            .with_duration(Duration::from_secs(90))
            .with_environment_variable("STAGE", "dev")
            .with_managed_policy(ManagedPolicyRef::aws_managed("AmazonS3FullAccess"))
            .build(&mut compiler)
            .unwrap();

        assert_eq!(handle.function_name, "acme-kb-dev-ingest");
        assert_eq!(handle.function_arn, ResourceAttribute::new("IngestFunction", "Arn"));

        let template = compiler.into_template();
        let function = &template.resources["IngestFunction"];
        assert_eq!(function.resource_type, LAMBDA_FUNCTION);
        assert_eq!(function.properties["Runtime"], "python3.13");
        assert_eq!(function.properties["Architectures"][0], "arm64");
        assert_eq!(function.properties["Timeout"], 90);
        assert_eq!(function.properties["Environment"]["Variables"]["STAGE"], "dev");
        assert_eq!(function.properties["Role"]["Fn::GetAtt"][0], "IngestRole");
        assert_eq!(function.depends_on, vec!["IngestRole", "IngestLogGroup"]);

        let log_group = &template.resources["IngestLogGroup"];
        assert_eq!(log_group.properties["LogGroupName"], "/aws/lambda/acme-kb-dev-ingest");
        assert_eq!(log_group.properties["RetentionInDays"], 7);
        assert_eq!(log_group.deletion_policy.as_deref(), Some("Delete"));

        let role = &template.resources["IngestRole"];
        assert_eq!(
            role.properties["ManagedPolicyArns"],
            json!([
                "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole",
                "arn:aws:iam::aws:policy/AmazonS3FullAccess",
            ])
        );
        assert_eq!(
            role.properties["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
    }

    #[test]
    fn test_duplicate_function_name() {
        let mut compiler = TemplateCompiler::new("Stack");
        let props = FunctionProps::new("ingest", &env());
        PythonFunctionBuilder::new(compiler.scope().child("A"), props.clone())
            .build(&mut compiler)
            .unwrap();
        let err = PythonFunctionBuilder::new(compiler.scope().child("B"), props)
            .build(&mut compiler)
            .unwrap_err();
        assert!(err.to_string().contains("already materialized"));
    }

    #[test]
    fn test_duplicate_logical_id() {
        let mut compiler = TemplateCompiler::new("Stack");
        let scope = compiler.scope().child("Same");
        PythonFunctionBuilder::new(scope.clone(), FunctionProps::new("a", &env()))
            .build(&mut compiler)
            .unwrap();
        let err = PythonFunctionBuilder::new(scope, FunctionProps::new("b", &env()))
            .build(&mut compiler)
            .unwrap_err();
        assert_eq!(err.to_string(), "Logical id 'SameFunction' is already used in this stack");
    }

    #[test]
    fn test_vpc_subnets_become_parameters() {
        let mut compiler = TemplateCompiler::new("Stack");
        PythonFunctionBuilder::new(compiler.scope().child("Db"), FunctionProps::new("db", &env()))
            .with_vpc(VpcRef::new("vpc-123"), [SecurityGroupRef::new("sg-1")], None)
            .build(&mut compiler)
            .unwrap();

        let template = compiler.into_template();
        let config = &template.resources["DbFunction"].properties["VpcConfig"];
        assert_eq!(config["SecurityGroupIds"], json!(["sg-1"]));
        assert_eq!(config["SubnetIds"], json!({ "Ref": "vpc123PrivateWithEgressSubnets" }));
        assert!(template.parameters.contains_key("vpc123PrivateWithEgressSubnets"));
    }

    #[test]
    fn test_exports() {
        let mut compiler = TemplateCompiler::new("Stack");
        let scope = compiler.scope().child("Fn");
        let handle = PythonFunctionBuilder::new(scope, FunctionProps::new("f", &env()))
            .build(&mut compiler)
            .unwrap();

        let scope = compiler.scope().child("FnARN");
        compiler
            .export(&scope, "acme-kb-dev-f-arn", handle.export_value())
            .unwrap();
        let err = compiler
            .export(
                &compiler.scope().child("Other"),
                "acme-kb-dev-f-arn",
                handle.export_value(),
            )
            .unwrap_err();
        assert!(matches!(err, CompilerError::DuplicateExport(_)));

        let missing = ExportValue::Attribute(ResourceAttribute::new("Nope", "Arn"));
        assert!(matches!(
            compiler.export(&compiler.scope().child("X"), "x", missing),
            Err(CompilerError::UnknownResource(_))
        ));

        let template = compiler.into_template();
        assert_eq!(
            template.outputs["FnARN"].value,
            json!({ "Fn::GetAtt": ["FnFunction", "Arn"] })
        );
    }

    #[test]
    fn test_secret_and_layer() {
        let mut compiler = TemplateCompiler::new("Stack");
        let secret = compiler
            .declare_secret(&compiler.scope().child("SecretStack"), "acme-kb-dev-secret")
            .unwrap();
        assert_eq!(secret.name, "acme-kb-dev-secret");
        assert_eq!(compiler.template().resources["SecretStack"].resource_type, SECRET);

        assert!(compiler.import_layer(&compiler.scope().child("Layer"), "not-an-arn").is_err());
    }
}
