//! EC2 handlers. Plain verbs are queue-group unary calls on
//! `ec2.<Action>`; the volume family talks to the EBS daemon subjects;
//! `DescribeInstances` and `DescribeInstanceTypes` fan out to every node;
//! the region/zone/attribute describes answer locally.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use hive_bus::subjects;
use hive_types::api::ec2::*;
use hive_types::api::ReturnOutput;
use hive_types::error::{ApiError, Code};

use super::{bus, required};
use crate::auth::AuthContext;
use crate::dispatch::ServiceDispatcher;
use crate::AppState;

async fn unary<I: Serialize, O: DeserializeOwned>(
    state: &AppState,
    subject: &str,
    input: &I,
) -> Result<O, ApiError> {
    hive_bus::request(bus(state)?.as_ref(), subject, input).await
}

/// Wires up the EC2 registry.
pub(crate) fn register(d: &mut ServiceDispatcher) {
    // Local-only describes.
    d.register("DescribeRegions", describe_regions);
    d.register("DescribeAvailabilityZones", describe_availability_zones);
    d.register("DescribeAccountAttributes", describe_account_attributes);

    // Cluster-wide fan-outs.
    d.register("DescribeInstances", describe_instances);
    d.register("DescribeInstanceTypes", describe_instance_types);

    // Instance lifecycle.
    d.register(
        "RunInstances",
        |s: Arc<AppState>, _c: AuthContext, i: RunInstancesInput| async move {
            unary::<_, RunInstancesOutput>(&s, &subjects::ec2_action("RunInstances"), &i).await
        },
    );
    d.register(
        "StartInstances",
        |s: Arc<AppState>, _c: AuthContext, i: InstanceIdsInput| async move {
            // The start daemon listens on the historical short subject.
            unary::<_, StartInstancesOutput>(&s, "ec2.start", &i).await
        },
    );
    d.register(
        "StopInstances",
        |s: Arc<AppState>, _c: AuthContext, i: InstanceIdsInput| async move {
            unary::<_, StopInstancesOutput>(&s, &subjects::ec2_action("StopInstances"), &i).await
        },
    );
    d.register(
        "TerminateInstances",
        |s: Arc<AppState>, _c: AuthContext, i: InstanceIdsInput| async move {
            unary::<_, TerminateInstancesOutput>(
                &s,
                &subjects::ec2_action("TerminateInstances"),
                &i,
            )
            .await
        },
    );
    d.register(
        "RebootInstances",
        |s: Arc<AppState>, _c: AuthContext, i: InstanceIdsInput| async move {
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("RebootInstances"), &i).await
        },
    );
    d.register(
        "ModifyInstanceAttribute",
        |s: Arc<AppState>, _c: AuthContext, i: ModifyInstanceAttributeInput| async move {
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("ModifyInstanceAttribute"), &i)
                .await
        },
    );

    // Key pairs.
    d.register(
        "CreateKeyPair",
        |s: Arc<AppState>, _c: AuthContext, i: CreateKeyPairInput| async move {
            required(i.key_name.clone(), "KeyName")?;
            unary::<_, CreateKeyPairOutput>(&s, &subjects::ec2_action("CreateKeyPair"), &i).await
        },
    );
    d.register(
        "ImportKeyPair",
        |s: Arc<AppState>, _c: AuthContext, i: ImportKeyPairInput| async move {
            required(i.key_name.clone(), "KeyName")?;
            required(i.public_key_material.clone(), "PublicKeyMaterial")?;
            unary::<_, ImportKeyPairOutput>(&s, &subjects::ec2_action("ImportKeyPair"), &i).await
        },
    );
    d.register(
        "DescribeKeyPairs",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeKeyPairsInput| async move {
            unary::<_, DescribeKeyPairsOutput>(&s, &subjects::ec2_action("DescribeKeyPairs"), &i)
                .await
        },
    );
    d.register(
        "DeleteKeyPair",
        |s: Arc<AppState>, _c: AuthContext, i: DeleteKeyPairInput| async move {
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeleteKeyPair"), &i).await
        },
    );

    // Images.
    d.register(
        "DescribeImages",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeImagesInput| async move {
            unary::<_, DescribeImagesOutput>(&s, &subjects::ec2_action("DescribeImages"), &i)
                .await
        },
    );
    d.register(
        "CreateImage",
        |s: Arc<AppState>, _c: AuthContext, i: CreateImageInput| async move {
            required(i.instance_id.clone(), "InstanceId")?;
            required(i.name.clone(), "Name")?;
            unary::<_, CreateImageOutput>(&s, &subjects::ec2_action("CreateImage"), &i).await
        },
    );
    d.register(
        "DeregisterImage",
        |s: Arc<AppState>, _c: AuthContext, i: DeregisterImageInput| async move {
            required(i.image_id.clone(), "ImageId")?;
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeregisterImage"), &i).await
        },
    );

    // Tags.
    d.register(
        "CreateTags",
        |s: Arc<AppState>, _c: AuthContext, i: ModifyTagsInput| async move {
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("CreateTags"), &i).await
        },
    );
    d.register(
        "DeleteTags",
        |s: Arc<AppState>, _c: AuthContext, i: ModifyTagsInput| async move {
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeleteTags"), &i).await
        },
    );
    d.register(
        "DescribeTags",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeTagsInput| async move {
            unary::<_, DescribeTagsOutput>(&s, &subjects::ec2_action("DescribeTags"), &i).await
        },
    );

    // Volumes ride the EBS daemon subjects.
    d.register(
        "CreateVolume",
        |s: Arc<AppState>, _c: AuthContext, i: CreateVolumeInput| async move {
            unary::<_, Volume>(&s, &subjects::ec2_action("CreateVolume"), &i).await
        },
    );
    d.register(
        "DescribeVolumes",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeVolumesInput| async move {
            unary::<_, DescribeVolumesOutput>(&s, &subjects::ec2_action("DescribeVolumes"), &i)
                .await
        },
    );
    d.register(
        "AttachVolume",
        |s: Arc<AppState>, _c: AuthContext, i: AttachVolumeInput| async move {
            required(i.volume_id.clone(), "VolumeId")?;
            required(i.instance_id.clone(), "InstanceId")?;
            unary::<_, VolumeAttachment>(&s, subjects::EBS_MOUNT, &i).await
        },
    );
    d.register("DetachVolume", detach_volume);
    d.register(
        "DeleteVolume",
        |s: Arc<AppState>, _c: AuthContext, i: DeleteVolumeInput| async move {
            required(i.volume_id.clone(), "VolumeId")?;
            unary::<_, ReturnOutput>(&s, subjects::EBS_DELETE, &i).await
        },
    );

    // Snapshots.
    d.register(
        "CreateSnapshot",
        |s: Arc<AppState>, _c: AuthContext, i: CreateSnapshotInput| async move {
            let volume_id = required(i.volume_id.clone(), "VolumeId")?;
            unary::<_, Snapshot>(&s, &subjects::ebs_snapshot(&volume_id), &i).await
        },
    );
    d.register(
        "DescribeSnapshots",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeSnapshotsInput| async move {
            unary::<_, DescribeSnapshotsOutput>(
                &s,
                &subjects::ec2_action("DescribeSnapshots"),
                &i,
            )
            .await
        },
    );
    d.register(
        "DeleteSnapshot",
        |s: Arc<AppState>, _c: AuthContext, i: DeleteSnapshotInput| async move {
            required(i.snapshot_id.clone(), "SnapshotId")?;
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeleteSnapshot"), &i).await
        },
    );

    // VPC mutations persist via the networking daemon, then announce the
    // change as a lifecycle event.
    d.register("CreateVpc", create_vpc);
    d.register(
        "DescribeVpcs",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeVpcsInput| async move {
            unary::<_, DescribeVpcsOutput>(&s, &subjects::ec2_action("DescribeVpcs"), &i).await
        },
    );
    d.register("DeleteVpc", delete_vpc);
    d.register("CreateSubnet", create_subnet);
    d.register(
        "DescribeSubnets",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeSubnetsInput| async move {
            unary::<_, DescribeSubnetsOutput>(&s, &subjects::ec2_action("DescribeSubnets"), &i)
                .await
        },
    );
    d.register("DeleteSubnet", delete_subnet);
    d.register(
        "CreateInternetGateway",
        |s: Arc<AppState>, _c: AuthContext, i: CreateInternetGatewayInput| async move {
            let gateway: InternetGateway =
                unary(&s, &subjects::ec2_action("CreateInternetGateway"), &i).await?;
            Ok(CreateInternetGatewayOutput {
                internet_gateway: Some(gateway),
            })
        },
    );
    d.register(
        "DescribeInternetGateways",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeInternetGatewaysInput| async move {
            unary::<_, DescribeInternetGatewaysOutput>(
                &s,
                &subjects::ec2_action("DescribeInternetGateways"),
                &i,
            )
            .await
        },
    );
    d.register("AttachInternetGateway", attach_internet_gateway);
    d.register("DetachInternetGateway", detach_internet_gateway);
    d.register(
        "DeleteInternetGateway",
        |s: Arc<AppState>, _c: AuthContext, i: DeleteInternetGatewayInput| async move {
            required(i.internet_gateway_id.clone(), "InternetGatewayId")?;
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeleteInternetGateway"), &i)
                .await
        },
    );

    // Network interfaces.
    d.register(
        "CreateNetworkInterface",
        |s: Arc<AppState>, _c: AuthContext, i: CreateNetworkInterfaceInput| async move {
            required(i.subnet_id.clone(), "SubnetId")?;
            let interface: NetworkInterface =
                unary(&s, &subjects::ec2_action("CreateNetworkInterface"), &i).await?;
            Ok(CreateNetworkInterfaceOutput {
                network_interface: Some(interface),
            })
        },
    );
    d.register(
        "DescribeNetworkInterfaces",
        |s: Arc<AppState>, _c: AuthContext, i: DescribeNetworkInterfacesInput| async move {
            unary::<_, DescribeNetworkInterfacesOutput>(
                &s,
                &subjects::ec2_action("DescribeNetworkInterfaces"),
                &i,
            )
            .await
        },
    );
    d.register(
        "DeleteNetworkInterface",
        |s: Arc<AppState>, _c: AuthContext, i: DeleteNetworkInterfaceInput| async move {
            required(i.network_interface_id.clone(), "NetworkInterfaceId")?;
            unary::<_, ReturnOutput>(&s, &subjects::ec2_action("DeleteNetworkInterface"), &i)
                .await
        },
    );
}

// --- Local describes ---

async fn describe_regions(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DescribeRegionsInput,
) -> Result<DescribeRegionsOutput, ApiError> {
    let region = state.config.region.clone();
    let mut regions = vec![Region {
        region_name: Some(region.clone()),
        endpoint: Some(format!("ec2.{region}.amazonaws.com")),
        opt_in_status: Some("opt-in-not-required".to_string()),
    }];
    if !input.region_names.is_empty() {
        regions.retain(|r| {
            r.region_name
                .as_deref()
                .is_some_and(|name| input.region_names.iter().any(|want| want == name))
        });
    }
    Ok(DescribeRegionsOutput { regions })
}

async fn describe_availability_zones(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DescribeAvailabilityZonesInput,
) -> Result<DescribeAvailabilityZonesOutput, ApiError> {
    let region = state.config.region.clone();
    let mut zones: Vec<AvailabilityZone> = state
        .config
        .zone_suffixes
        .iter()
        .enumerate()
        .map(|(i, suffix)| AvailabilityZone {
            zone_name: Some(format!("{region}{suffix}")),
            zone_id: Some(format!("{region}-az{}", i + 1)),
            state: Some("available".to_string()),
            region_name: Some(region.clone()),
        })
        .collect();
    if !input.zone_names.is_empty() {
        zones.retain(|z| {
            z.zone_name
                .as_deref()
                .is_some_and(|name| input.zone_names.iter().any(|want| want == name))
        });
    }
    Ok(DescribeAvailabilityZonesOutput {
        availability_zones: zones,
    })
}

async fn describe_account_attributes(
    _state: Arc<AppState>,
    _ctx: AuthContext,
    input: DescribeAccountAttributesInput,
) -> Result<DescribeAccountAttributesOutput, ApiError> {
    let attribute = |name: &str, values: &[&str]| AccountAttribute {
        attribute_name: Some(name.to_string()),
        attribute_values: values
            .iter()
            .map(|v| AccountAttributeValue {
                attribute_value: Some(v.to_string()),
            })
            .collect(),
    };
    let mut attributes = vec![
        attribute("supported-platforms", &["VPC"]),
        attribute("default-vpc", &["none"]),
        attribute("max-instances", &["20"]),
        attribute("vpc-max-security-groups-per-interface", &["5"]),
    ];
    if !input.attribute_names.is_empty() {
        attributes.retain(|a| {
            a.attribute_name
                .as_deref()
                .is_some_and(|name| input.attribute_names.iter().any(|want| want == name))
        });
    }
    Ok(DescribeAccountAttributesOutput {
        account_attributes: attributes,
    })
}

// --- Fan-outs ---

async fn describe_instances(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DescribeInstancesInput,
) -> Result<DescribeInstancesOutput, ApiError> {
    let bus = bus(&state)?;
    let expected = hive_bus::discover_nodes(bus.as_ref(), state.config.expected_nodes).await;
    let parts: Vec<DescribeInstancesOutput> = hive_bus::fanout(
        bus.as_ref(),
        &subjects::ec2_action("DescribeInstances"),
        &input,
        expected,
    )
    .await?;

    // Replies are folded in arrival order; nothing downstream may rely
    // on node ordering.
    let mut reservations: Vec<Reservation> =
        parts.into_iter().flat_map(|p| p.reservations).collect();

    // The stopped set lives with whichever node holds the state store.
    match hive_bus::request::<_, DescribeInstancesOutput>(
        bus.as_ref(),
        subjects::EC2_DESCRIBE_STOPPED,
        &input,
    )
    .await
    {
        Ok(stopped) => reservations.extend(stopped.reservations),
        Err(e) => warn!(error = %e, "stopped-instance set unavailable"),
    }

    Ok(DescribeInstancesOutput {
        reservations,
        next_token: None,
    })
}

async fn describe_instance_types(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DescribeInstanceTypesInput,
) -> Result<DescribeInstanceTypesOutput, ApiError> {
    let bus = bus(&state)?;
    let expected = hive_bus::discover_nodes(bus.as_ref(), state.config.expected_nodes).await;
    let parts: Vec<DescribeInstanceTypesOutput> = hive_bus::fanout(
        bus.as_ref(),
        &subjects::ec2_action("DescribeInstanceTypes"),
        &input,
        expected,
    )
    .await?;
    Ok(DescribeInstanceTypesOutput {
        instance_types: parts.into_iter().flat_map(|p| p.instance_types).collect(),
    })
}

// --- Volume detach: resolve the resident node first ---

async fn detach_volume(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DetachVolumeInput,
) -> Result<VolumeAttachment, ApiError> {
    let volume_id = required(input.volume_id.clone(), "VolumeId")?;
    let lookup = DescribeVolumesInput {
        volume_ids: vec![volume_id.clone()],
        ..Default::default()
    };
    let volumes: DescribeVolumesOutput = unary(
        &state,
        &subjects::ec2_action("DescribeVolumes"),
        &lookup,
    )
    .await?;
    let volume = volumes
        .volumes
        .into_iter()
        .find(|v| v.volume_id.as_deref() == Some(volume_id.as_str()))
        .ok_or_else(|| {
            ApiError::with_message(Code::NoSuchEntity, format!("volume {volume_id}"))
        })?;
    let node = volume.node.ok_or_else(|| {
        ApiError::with_message(
            Code::DependencyViolation,
            format!("volume {volume_id} is not resident on any node"),
        )
    })?;
    unary(&state, &subjects::ebs_unmount(&node), &input).await
}

// --- VPC mutations with lifecycle events ---

async fn publish_event<P: Serialize>(state: &AppState, subject: &str, payload: &P) {
    match bus(state) {
        Ok(bus) => {
            if let Err(e) = hive_bus::publish_event(bus.as_ref(), subject, payload).await {
                warn!(subject = %subject, error = %e, "lifecycle event not published");
            }
        }
        Err(e) => warn!(subject = %subject, error = %e, "lifecycle event not published"),
    }
}

async fn create_vpc(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: CreateVpcInput,
) -> Result<CreateVpcOutput, ApiError> {
    required(input.cidr_block.clone(), "CidrBlock")?;
    let vpc: Vpc = unary(&state, &subjects::ec2_action("CreateVpc"), &input).await?;
    publish_event(&state, "vpc.create", &vpc).await;
    Ok(CreateVpcOutput { vpc: Some(vpc) })
}

async fn delete_vpc(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DeleteVpcInput,
) -> Result<ReturnOutput, ApiError> {
    required(input.vpc_id.clone(), "VpcId")?;
    let out: ReturnOutput = unary(&state, &subjects::ec2_action("DeleteVpc"), &input).await?;
    publish_event(&state, "vpc.delete", &input).await;
    Ok(out)
}

async fn create_subnet(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: CreateSubnetInput,
) -> Result<CreateSubnetOutput, ApiError> {
    required(input.vpc_id.clone(), "VpcId")?;
    required(input.cidr_block.clone(), "CidrBlock")?;
    let subnet: Subnet = unary(&state, &subjects::ec2_action("CreateSubnet"), &input).await?;
    publish_event(&state, "vpc.create-subnet", &subnet).await;
    Ok(CreateSubnetOutput {
        subnet: Some(subnet),
    })
}

async fn delete_subnet(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: DeleteSubnetInput,
) -> Result<ReturnOutput, ApiError> {
    required(input.subnet_id.clone(), "SubnetId")?;
    let out: ReturnOutput = unary(&state, &subjects::ec2_action("DeleteSubnet"), &input).await?;
    publish_event(&state, "vpc.delete-subnet", &input).await;
    Ok(out)
}

async fn attach_internet_gateway(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: InternetGatewayVpcInput,
) -> Result<ReturnOutput, ApiError> {
    required(input.internet_gateway_id.clone(), "InternetGatewayId")?;
    required(input.vpc_id.clone(), "VpcId")?;
    let out: ReturnOutput = unary(
        &state,
        &subjects::ec2_action("AttachInternetGateway"),
        &input,
    )
    .await?;
    publish_event(&state, "vpc.igw-attach", &input).await;
    Ok(out)
}

async fn detach_internet_gateway(
    state: Arc<AppState>,
    _ctx: AuthContext,
    input: InternetGatewayVpcInput,
) -> Result<ReturnOutput, ApiError> {
    required(input.internet_gateway_id.clone(), "InternetGatewayId")?;
    required(input.vpc_id.clone(), "VpcId")?;
    let out: ReturnOutput = unary(
        &state,
        &subjects::ec2_action("DetachInternetGateway"),
        &input,
    )
    .await?;
    publish_event(&state, "vpc.igw-detach", &input).await;
    Ok(out)
}
