//! EC2 action shapes. Output fields carry their camelCase location names,
//! which is what the EC2 XML envelope expects; the query decoder accepts
//! either spelling on the way in.

use chrono::{DateTime, Utc};
use hive_codec::aws_shape;
use hive_codec::query::Blob;

use super::{Filter, Tag, TagSpecification};

// --- Instances ---

aws_shape! {
    /// EBS settings inside a block-device mapping.
    pub struct EbsBlockDevice {
        volume_size: Option<i64> => "VolumeSize" | "volumeSize",
        volume_type: Option<String> => "VolumeType" | "volumeType",
        snapshot_id: Option<String> => "SnapshotId" | "snapshotId",
        iops: Option<i64> => "Iops" | "iops",
        delete_on_termination: Option<bool> => "DeleteOnTermination" | "deleteOnTermination",
    }
}

aws_shape! {
    /// One block-device mapping of a launch request or instance.
    pub struct BlockDeviceMapping {
        device_name: Option<String> => "DeviceName" | "deviceName",
        virtual_name: Option<String> => "VirtualName" | "virtualName",
        ebs: Option<EbsBlockDevice> => "Ebs" | "ebs",
    }
}

aws_shape! {
    /// Placement of an instance.
    pub struct Placement {
        availability_zone: Option<String> => "AvailabilityZone" | "availabilityZone",
        tenancy: Option<String> => "Tenancy" | "tenancy",
    }
}

aws_shape! {
    /// An instance state code/name pair.
    pub struct InstanceState {
        code: Option<i64> => "Code" | "code",
        name: Option<String> => "Name" | "name",
    }
}

aws_shape! {
    /// One virtual machine.
    pub struct Instance {
        instance_id: Option<String> => "InstanceId" | "instanceId",
        image_id: Option<String> => "ImageId" | "imageId",
        state: Option<InstanceState> => "State" | "instanceState",
        instance_type: Option<String> => "InstanceType" | "instanceType",
        key_name: Option<String> => "KeyName" | "keyName",
        launch_time: Option<DateTime<Utc>> => "LaunchTime" | "launchTime",
        placement: Option<Placement> => "Placement" | "placement",
        subnet_id: Option<String> => "SubnetId" | "subnetId",
        vpc_id: Option<String> => "VpcId" | "vpcId",
        private_ip_address: Option<String> => "PrivateIpAddress" | "privateIpAddress",
        public_ip_address: Option<String> => "PublicIpAddress" | "ipAddress",
        block_device_mappings: Vec<BlockDeviceMapping> => "BlockDeviceMapping" | "blockDeviceMapping",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// A reservation: the unit EC2 groups launched instances under.
    pub struct Reservation {
        reservation_id: Option<String> => "ReservationId" | "reservationId",
        owner_id: Option<String> => "OwnerId" | "ownerId",
        instances: Vec<Instance> => "Instances" | "instancesSet",
    }
}

aws_shape! {
    /// Parameters of `RunInstances`.
    pub struct RunInstancesInput {
        image_id: Option<String> => "ImageId",
        instance_type: Option<String> => "InstanceType",
        min_count: Option<i64> => "MinCount",
        max_count: Option<i64> => "MaxCount",
        key_name: Option<String> => "KeyName",
        subnet_id: Option<String> => "SubnetId",
        security_group_ids: Vec<String> => "SecurityGroupId" | "securityGroupId",
        block_device_mappings: Vec<BlockDeviceMapping> => "BlockDeviceMapping" | "blockDeviceMapping",
        tag_specifications: Vec<TagSpecification> => "TagSpecification",
        user_data: Option<Blob> => "UserData",
    }
}

aws_shape! {
    /// Result of `RunInstances`: the new reservation, inlined.
    pub struct RunInstancesOutput {
        reservation_id: Option<String> => "ReservationId" | "reservationId",
        owner_id: Option<String> => "OwnerId" | "ownerId",
        instances: Vec<Instance> => "Instances" | "instancesSet",
    }
}

aws_shape! {
    /// Parameters of `DescribeInstances`.
    pub struct DescribeInstancesInput {
        instance_ids: Vec<String> => "InstanceId" | "instanceId",
        filters: Vec<Filter> => "Filter",
        max_results: Option<i64> => "MaxResults",
        next_token: Option<String> => "NextToken",
    }
}

aws_shape! {
    /// Result of `DescribeInstances`.
    pub struct DescribeInstancesOutput {
        reservations: Vec<Reservation> => "Reservations" | "reservationSet",
        next_token: Option<String> => "NextToken" | "nextToken",
    }
}

aws_shape! {
    /// Parameters shared by the instance state-change verbs.
    pub struct InstanceIdsInput {
        instance_ids: Vec<String> => "InstanceId" | "instanceId",
        force: Option<bool> => "Force",
    }
}

aws_shape! {
    /// A previous/current state transition for one instance.
    pub struct InstanceStateChange {
        instance_id: Option<String> => "InstanceId" | "instanceId",
        current_state: Option<InstanceState> => "CurrentState" | "currentState",
        previous_state: Option<InstanceState> => "PreviousState" | "previousState",
    }
}

aws_shape! {
    /// Result of `StartInstances`.
    pub struct StartInstancesOutput {
        starting_instances: Vec<InstanceStateChange> => "StartingInstances" | "instancesSet",
    }
}

aws_shape! {
    /// Result of `StopInstances`.
    pub struct StopInstancesOutput {
        stopping_instances: Vec<InstanceStateChange> => "StoppingInstances" | "instancesSet",
    }
}

aws_shape! {
    /// Result of `TerminateInstances`.
    pub struct TerminateInstancesOutput {
        terminating_instances: Vec<InstanceStateChange> => "TerminatingInstances" | "instancesSet",
    }
}

aws_shape! {
    /// Parameters of `ModifyInstanceAttribute`.
    pub struct ModifyInstanceAttributeInput {
        instance_id: Option<String> => "InstanceId" | "instanceId",
        attribute: Option<String> => "Attribute" | "attribute",
        value: Option<String> => "Value" | "value",
    }
}

aws_shape! {
    /// Virtual-CPU description of an instance type.
    pub struct VCpuInfo {
        default_vcpus: Option<i64> => "DefaultVCpus" | "defaultVCpus",
    }
}

aws_shape! {
    /// Memory description of an instance type.
    pub struct MemoryInfo {
        size_in_mib: Option<i64> => "SizeInMiB" | "sizeInMiB",
    }
}

aws_shape! {
    /// One instance type a node can launch.
    pub struct InstanceTypeInfo {
        instance_type: Option<String> => "InstanceType" | "instanceType",
        vcpu_info: Option<VCpuInfo> => "VCpuInfo" | "vCpuInfo",
        memory_info: Option<MemoryInfo> => "MemoryInfo" | "memoryInfo",
    }
}

aws_shape! {
    /// Parameters of `DescribeInstanceTypes`.
    pub struct DescribeInstanceTypesInput {
        instance_types: Vec<String> => "InstanceType" | "instanceType",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeInstanceTypes`.
    pub struct DescribeInstanceTypesOutput {
        instance_types: Vec<InstanceTypeInfo> => "InstanceTypes" | "instanceTypeSet",
    }
}

// --- Key pairs ---

aws_shape! {
    /// Parameters of `CreateKeyPair`.
    pub struct CreateKeyPairInput {
        key_name: Option<String> => "KeyName",
        key_type: Option<String> => "KeyType",
    }
}

aws_shape! {
    /// Result of `CreateKeyPair`; the private key is returned exactly once.
    pub struct CreateKeyPairOutput {
        key_name: Option<String> => "KeyName" | "keyName",
        key_fingerprint: Option<String> => "KeyFingerprint" | "keyFingerprint",
        key_material: Option<String> => "KeyMaterial" | "keyMaterial",
        key_pair_id: Option<String> => "KeyPairId" | "keyPairId",
    }
}

aws_shape! {
    /// Parameters of `ImportKeyPair`. The public key material accepts
    /// either base64 or raw bytes; the dispatcher repairs the SDK's
    /// percent-encoded `==` padding before this shape is decoded.
    pub struct ImportKeyPairInput {
        key_name: Option<String> => "KeyName",
        public_key_material: Option<Blob> => "PublicKeyMaterial",
    }
}

aws_shape! {
    /// Result of `ImportKeyPair`.
    pub struct ImportKeyPairOutput {
        key_name: Option<String> => "KeyName" | "keyName",
        key_fingerprint: Option<String> => "KeyFingerprint" | "keyFingerprint",
        key_pair_id: Option<String> => "KeyPairId" | "keyPairId",
    }
}

aws_shape! {
    /// Parameters of `DescribeKeyPairs`.
    pub struct DescribeKeyPairsInput {
        key_names: Vec<String> => "KeyName" | "keyName",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// One stored key pair.
    pub struct KeyPairInfo {
        key_name: Option<String> => "KeyName" | "keyName",
        key_fingerprint: Option<String> => "KeyFingerprint" | "keyFingerprint",
        key_pair_id: Option<String> => "KeyPairId" | "keyPairId",
        key_type: Option<String> => "KeyType" | "keyType",
        create_time: Option<DateTime<Utc>> => "CreateTime" | "createTime",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Result of `DescribeKeyPairs`.
    pub struct DescribeKeyPairsOutput {
        key_pairs: Vec<KeyPairInfo> => "KeyPairs" | "keySet",
    }
}

aws_shape! {
    /// Parameters of `DeleteKeyPair`.
    pub struct DeleteKeyPairInput {
        key_name: Option<String> => "KeyName",
        key_pair_id: Option<String> => "KeyPairId",
    }
}

// --- Images ---

aws_shape! {
    /// Parameters of `DescribeImages`.
    pub struct DescribeImagesInput {
        image_ids: Vec<String> => "ImageId" | "imageId",
        owners: Vec<String> => "Owner",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// One machine image.
    pub struct Image {
        image_id: Option<String> => "ImageId" | "imageId",
        name: Option<String> => "Name" | "name",
        description: Option<String> => "Description" | "description",
        state: Option<String> => "State" | "imageState",
        architecture: Option<String> => "Architecture" | "architecture",
        creation_date: Option<String> => "CreationDate" | "creationDate",
        owner_id: Option<String> => "OwnerId" | "imageOwnerId",
        root_device_name: Option<String> => "RootDeviceName" | "rootDeviceName",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Result of `DescribeImages`.
    pub struct DescribeImagesOutput {
        images: Vec<Image> => "Images" | "imagesSet",
    }
}

aws_shape! {
    /// Parameters of `CreateImage`.
    pub struct CreateImageInput {
        instance_id: Option<String> => "InstanceId" | "instanceId",
        name: Option<String> => "Name" | "name",
        description: Option<String> => "Description" | "description",
        no_reboot: Option<bool> => "NoReboot" | "noReboot",
    }
}

aws_shape! {
    /// Result of `CreateImage`.
    pub struct CreateImageOutput {
        image_id: Option<String> => "ImageId" | "imageId",
    }
}

aws_shape! {
    /// Parameters of `DeregisterImage`.
    pub struct DeregisterImageInput {
        image_id: Option<String> => "ImageId" | "imageId",
    }
}

// --- Volumes ---

aws_shape! {
    /// Parameters of `CreateVolume`.
    pub struct CreateVolumeInput {
        availability_zone: Option<String> => "AvailabilityZone",
        size: Option<i64> => "Size",
        volume_type: Option<String> => "VolumeType",
        snapshot_id: Option<String> => "SnapshotId",
        iops: Option<i64> => "Iops",
        encrypted: Option<bool> => "Encrypted",
        tag_specifications: Vec<TagSpecification> => "TagSpecification",
    }
}

aws_shape! {
    /// One volume attachment.
    pub struct VolumeAttachment {
        volume_id: Option<String> => "VolumeId" | "volumeId",
        instance_id: Option<String> => "InstanceId" | "instanceId",
        device: Option<String> => "Device" | "device",
        state: Option<String> => "State" | "status",
        attach_time: Option<DateTime<Utc>> => "AttachTime" | "attachTime",
    }
}

aws_shape! {
    /// One EBS volume. `Node` is the Hive extension naming the daemon node
    /// that currently holds the backing store; detach routing needs it.
    pub struct Volume {
        volume_id: Option<String> => "VolumeId" | "volumeId",
        size: Option<i64> => "Size" | "size",
        availability_zone: Option<String> => "AvailabilityZone" | "availabilityZone",
        state: Option<String> => "State" | "status",
        volume_type: Option<String> => "VolumeType" | "volumeType",
        snapshot_id: Option<String> => "SnapshotId" | "snapshotId",
        create_time: Option<DateTime<Utc>> => "CreateTime" | "createTime",
        attachments: Vec<VolumeAttachment> => "Attachments" | "attachmentSet",
        node: Option<String> => "Node" | "node",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Parameters of `DescribeVolumes`.
    pub struct DescribeVolumesInput {
        volume_ids: Vec<String> => "VolumeId" | "volumeId",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeVolumes`.
    pub struct DescribeVolumesOutput {
        volumes: Vec<Volume> => "Volumes" | "volumeSet",
    }
}

aws_shape! {
    /// Parameters of `AttachVolume`.
    pub struct AttachVolumeInput {
        volume_id: Option<String> => "VolumeId",
        instance_id: Option<String> => "InstanceId",
        device: Option<String> => "Device",
    }
}

aws_shape! {
    /// Parameters of `DetachVolume`.
    pub struct DetachVolumeInput {
        volume_id: Option<String> => "VolumeId",
        instance_id: Option<String> => "InstanceId",
        device: Option<String> => "Device",
        force: Option<bool> => "Force",
    }
}

aws_shape! {
    /// Parameters of `DeleteVolume`.
    pub struct DeleteVolumeInput {
        volume_id: Option<String> => "VolumeId",
    }
}

// --- Snapshots ---

aws_shape! {
    /// Parameters of `CreateSnapshot`.
    pub struct CreateSnapshotInput {
        volume_id: Option<String> => "VolumeId",
        description: Option<String> => "Description",
        tag_specifications: Vec<TagSpecification> => "TagSpecification",
    }
}

aws_shape! {
    /// One volume snapshot.
    pub struct Snapshot {
        snapshot_id: Option<String> => "SnapshotId" | "snapshotId",
        volume_id: Option<String> => "VolumeId" | "volumeId",
        state: Option<String> => "State" | "status",
        progress: Option<String> => "Progress" | "progress",
        start_time: Option<DateTime<Utc>> => "StartTime" | "startTime",
        description: Option<String> => "Description" | "description",
        volume_size: Option<i64> => "VolumeSize" | "volumeSize",
        owner_id: Option<String> => "OwnerId" | "ownerId",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Parameters of `DescribeSnapshots`.
    pub struct DescribeSnapshotsInput {
        snapshot_ids: Vec<String> => "SnapshotId" | "snapshotId",
        owners: Vec<String> => "Owner",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeSnapshots`.
    pub struct DescribeSnapshotsOutput {
        snapshots: Vec<Snapshot> => "Snapshots" | "snapshotSet",
    }
}

aws_shape! {
    /// Parameters of `DeleteSnapshot`.
    pub struct DeleteSnapshotInput {
        snapshot_id: Option<String> => "SnapshotId",
    }
}

// --- Tags ---

aws_shape! {
    /// Parameters of `CreateTags` and `DeleteTags`.
    pub struct ModifyTagsInput {
        resources: Vec<String> => "ResourceId" | "resourceId",
        tags: Vec<Tag> => "Tag" | "tagSet",
    }
}

aws_shape! {
    /// Parameters of `DescribeTags`.
    pub struct DescribeTagsInput {
        filters: Vec<Filter> => "Filter",
        max_results: Option<i64> => "MaxResults",
    }
}

aws_shape! {
    /// One tag binding, with the resource it is bound to.
    pub struct TagDescription {
        resource_id: Option<String> => "ResourceId" | "resourceId",
        resource_type: Option<String> => "ResourceType" | "resourceType",
        key: Option<String> => "Key" | "key",
        value: Option<String> => "Value" | "value",
    }
}

aws_shape! {
    /// Result of `DescribeTags`.
    pub struct DescribeTagsOutput {
        tags: Vec<TagDescription> => "Tags" | "tagSet",
    }
}

// --- VPC / networking ---

aws_shape! {
    /// Parameters of `CreateVpc`.
    pub struct CreateVpcInput {
        cidr_block: Option<String> => "CidrBlock",
        instance_tenancy: Option<String> => "InstanceTenancy",
        tag_specifications: Vec<TagSpecification> => "TagSpecification",
    }
}

aws_shape! {
    /// One VPC.
    pub struct Vpc {
        vpc_id: Option<String> => "VpcId" | "vpcId",
        state: Option<String> => "State" | "state",
        cidr_block: Option<String> => "CidrBlock" | "cidrBlock",
        is_default: Option<bool> => "IsDefault" | "isDefault",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Result of `CreateVpc`.
    pub struct CreateVpcOutput {
        vpc: Option<Vpc> => "Vpc" | "vpc",
    }
}

aws_shape! {
    /// Parameters of `DescribeVpcs`.
    pub struct DescribeVpcsInput {
        vpc_ids: Vec<String> => "VpcId" | "vpcId",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeVpcs`.
    pub struct DescribeVpcsOutput {
        vpcs: Vec<Vpc> => "Vpcs" | "vpcSet",
    }
}

aws_shape! {
    /// Parameters of `DeleteVpc`.
    pub struct DeleteVpcInput {
        vpc_id: Option<String> => "VpcId",
    }
}

aws_shape! {
    /// Parameters of `CreateSubnet`.
    pub struct CreateSubnetInput {
        vpc_id: Option<String> => "VpcId",
        cidr_block: Option<String> => "CidrBlock",
        availability_zone: Option<String> => "AvailabilityZone",
    }
}

aws_shape! {
    /// One subnet.
    pub struct Subnet {
        subnet_id: Option<String> => "SubnetId" | "subnetId",
        vpc_id: Option<String> => "VpcId" | "vpcId",
        cidr_block: Option<String> => "CidrBlock" | "cidrBlock",
        availability_zone: Option<String> => "AvailabilityZone" | "availabilityZone",
        state: Option<String> => "State" | "state",
        available_ip_address_count: Option<i64> => "AvailableIpAddressCount" | "availableIpAddressCount",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Result of `CreateSubnet`.
    pub struct CreateSubnetOutput {
        subnet: Option<Subnet> => "Subnet" | "subnet",
    }
}

aws_shape! {
    /// Parameters of `DescribeSubnets`.
    pub struct DescribeSubnetsInput {
        subnet_ids: Vec<String> => "SubnetId" | "subnetId",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeSubnets`.
    pub struct DescribeSubnetsOutput {
        subnets: Vec<Subnet> => "Subnets" | "subnetSet",
    }
}

aws_shape! {
    /// Parameters of `DeleteSubnet`.
    pub struct DeleteSubnetInput {
        subnet_id: Option<String> => "SubnetId",
    }
}

aws_shape! {
    /// One attachment binding an internet gateway to a VPC.
    pub struct InternetGatewayAttachment {
        vpc_id: Option<String> => "VpcId" | "vpcId",
        state: Option<String> => "State" | "state",
    }
}

aws_shape! {
    /// One internet gateway.
    pub struct InternetGateway {
        internet_gateway_id: Option<String> => "InternetGatewayId" | "internetGatewayId",
        attachments: Vec<InternetGatewayAttachment> => "Attachments" | "attachmentSet",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Parameters of `CreateInternetGateway`.
    pub struct CreateInternetGatewayInput {
        tag_specifications: Vec<TagSpecification> => "TagSpecification",
    }
}

aws_shape! {
    /// Result of `CreateInternetGateway`.
    pub struct CreateInternetGatewayOutput {
        internet_gateway: Option<InternetGateway> => "InternetGateway" | "internetGateway",
    }
}

aws_shape! {
    /// Parameters of `DescribeInternetGateways`.
    pub struct DescribeInternetGatewaysInput {
        internet_gateway_ids: Vec<String> => "InternetGatewayId" | "internetGatewayId",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeInternetGateways`.
    pub struct DescribeInternetGatewaysOutput {
        internet_gateways: Vec<InternetGateway> => "InternetGateways" | "internetGatewaySet",
    }
}

aws_shape! {
    /// Parameters of `AttachInternetGateway` / `DetachInternetGateway`.
    pub struct InternetGatewayVpcInput {
        internet_gateway_id: Option<String> => "InternetGatewayId" | "internetGatewayId",
        vpc_id: Option<String> => "VpcId" | "vpcId",
    }
}

aws_shape! {
    /// Parameters of `DeleteInternetGateway`.
    pub struct DeleteInternetGatewayInput {
        internet_gateway_id: Option<String> => "InternetGatewayId" | "internetGatewayId",
    }
}

aws_shape! {
    /// Parameters of `CreateNetworkInterface`.
    pub struct CreateNetworkInterfaceInput {
        subnet_id: Option<String> => "SubnetId",
        description: Option<String> => "Description",
        private_ip_address: Option<String> => "PrivateIpAddress",
        groups: Vec<String> => "SecurityGroupId" | "securityGroupId",
    }
}

aws_shape! {
    /// One elastic network interface.
    pub struct NetworkInterface {
        network_interface_id: Option<String> => "NetworkInterfaceId" | "networkInterfaceId",
        subnet_id: Option<String> => "SubnetId" | "subnetId",
        vpc_id: Option<String> => "VpcId" | "vpcId",
        description: Option<String> => "Description" | "description",
        private_ip_address: Option<String> => "PrivateIpAddress" | "privateIpAddress",
        mac_address: Option<String> => "MacAddress" | "macAddress",
        status: Option<String> => "Status" | "status",
        tags: Vec<Tag> => "Tags" | "tagSet",
    }
}

aws_shape! {
    /// Result of `CreateNetworkInterface`.
    pub struct CreateNetworkInterfaceOutput {
        network_interface: Option<NetworkInterface> => "NetworkInterface" | "networkInterface",
    }
}

aws_shape! {
    /// Parameters of `DescribeNetworkInterfaces`.
    pub struct DescribeNetworkInterfacesInput {
        network_interface_ids: Vec<String> => "NetworkInterfaceId" | "networkInterfaceId",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// Result of `DescribeNetworkInterfaces`.
    pub struct DescribeNetworkInterfacesOutput {
        network_interfaces: Vec<NetworkInterface> => "NetworkInterfaces" | "networkInterfaceSet",
    }
}

aws_shape! {
    /// Parameters of `DeleteNetworkInterface`.
    pub struct DeleteNetworkInterfaceInput {
        network_interface_id: Option<String> => "NetworkInterfaceId" | "networkInterfaceId",
    }
}

// --- Local describes ---

aws_shape! {
    /// Parameters of `DescribeRegions`.
    pub struct DescribeRegionsInput {
        region_names: Vec<String> => "RegionName" | "regionName",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// One region.
    pub struct Region {
        region_name: Option<String> => "RegionName" | "regionName",
        endpoint: Option<String> => "Endpoint" | "regionEndpoint",
        opt_in_status: Option<String> => "OptInStatus" | "optInStatus",
    }
}

aws_shape! {
    /// Result of `DescribeRegions`.
    pub struct DescribeRegionsOutput {
        regions: Vec<Region> => "Regions" | "regionInfo",
    }
}

aws_shape! {
    /// Parameters of `DescribeAvailabilityZones`.
    pub struct DescribeAvailabilityZonesInput {
        zone_names: Vec<String> => "ZoneName" | "zoneName",
        filters: Vec<Filter> => "Filter",
    }
}

aws_shape! {
    /// One availability zone.
    pub struct AvailabilityZone {
        zone_name: Option<String> => "ZoneName" | "zoneName",
        zone_id: Option<String> => "ZoneId" | "zoneId",
        state: Option<String> => "State" | "zoneState",
        region_name: Option<String> => "RegionName" | "regionName",
    }
}

aws_shape! {
    /// Result of `DescribeAvailabilityZones`.
    pub struct DescribeAvailabilityZonesOutput {
        availability_zones: Vec<AvailabilityZone> => "AvailabilityZones" | "availabilityZoneInfo",
    }
}

aws_shape! {
    /// Parameters of `DescribeAccountAttributes`.
    pub struct DescribeAccountAttributesInput {
        attribute_names: Vec<String> => "AttributeName" | "attributeName",
    }
}

aws_shape! {
    /// One value of an account attribute.
    pub struct AccountAttributeValue {
        attribute_value: Option<String> => "AttributeValue" | "attributeValue",
    }
}

aws_shape! {
    /// One account attribute.
    pub struct AccountAttribute {
        attribute_name: Option<String> => "AttributeName" | "attributeName",
        attribute_values: Vec<AccountAttributeValue> => "AttributeValues" | "attributeValueSet",
    }
}

aws_shape! {
    /// Result of `DescribeAccountAttributes`.
    pub struct DescribeAccountAttributesOutput {
        account_attributes: Vec<AccountAttribute> => "AccountAttributes" | "accountAttributeSet",
    }
}
