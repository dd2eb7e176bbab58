//! The `aws_shape!` macro declares an action shape once and derives the
//! query decode, XML encode, and serde (bus JSON) faces of it.

/// Declares an AWS action shape.
///
/// Each field names its wire form: the primary (query/JSON/XML) name,
/// optionally followed by `| "locationName"` when AWS also spells the
/// field in camelCase. The hint doubles as the XML element name, which is
/// how EC2 responses end up camelCased while IAM responses stay
/// TitleCased.
///
/// ```
/// use hive_codec::aws_shape;
///
/// aws_shape! {
///     /// One resource tag.
///     pub struct Tag {
///         key: Option<String> => "Key",
///         value: Option<String> => "Value",
///     }
/// }
/// ```
#[macro_export]
macro_rules! aws_shape {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => $wire:literal $(| $hint:literal)? ,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(default)]
        #[allow(missing_docs)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                #[serde(rename = $wire)]
                pub $field: $ty,
            )*
        }

        impl $crate::query::FromQuery for $name {
            fn from_query(
                q: &$crate::query::QueryMap,
                key: &str,
            ) -> ::std::result::Result<::std::option::Option<Self>, $crate::query::DecodeError>
            {
                if !key.is_empty() && !q.contains_tree(key) {
                    return ::std::result::Result::Ok(::std::option::Option::None);
                }
                #[allow(unused_mut)]
                let mut value = <Self as ::std::default::Default>::default();
                $(
                    if let ::std::option::Option::Some(resolved) =
                        $crate::query::field_key(q, key, &[$wire $(, $hint)?])
                    {
                        if let ::std::option::Option::Some(parsed) =
                            <$ty as $crate::query::FromQuery>::from_query(q, &resolved)?
                        {
                            value.$field = parsed;
                        }
                    }
                )*
                ::std::result::Result::Ok(::std::option::Option::Some(value))
            }
        }

        impl $crate::xml::ToXmlFields for $name {
            fn write_xml_fields(
                &self,
                #[allow(unused_variables)] w: &mut $crate::xml::XmlWriter,
            ) -> ::std::result::Result<(), $crate::xml::EncodeError> {
                $(
                    $crate::xml::ToXml::write_xml(
                        &self.$field,
                        w,
                        $crate::first_of!($($hint,)? $wire),
                    )?;
                )*
                ::std::result::Result::Ok(())
            }
        }

        impl $crate::xml::ToXml for $name {
            fn write_xml(
                &self,
                w: &mut $crate::xml::XmlWriter,
                tag: &str,
            ) -> ::std::result::Result<(), $crate::xml::EncodeError> {
                w.start(tag)?;
                $crate::xml::ToXmlFields::write_xml_fields(self, w)?;
                w.end(tag)
            }
        }
    };
}

/// Picks the first literal of a non-empty list. Used by [`aws_shape!`] to
/// prefer a field's location-name hint as its XML element name.
#[macro_export]
macro_rules! first_of {
    ($first:literal $(, $rest:literal)* $(,)?) => {
        $first
    };
}

#[cfg(test)]
mod tests {
    use crate::query::{decode_args, QueryMap};
    use crate::xml::{ToXml, XmlWriter};

    aws_shape! {
        /// One resource tag.
        pub struct Tag {
            key: Option<String> => "Key",
            value: Option<String> => "Value",
        }
    }

    aws_shape! {
        pub struct TagSpecification {
            resource_type: Option<String> => "ResourceType",
            tags: Vec<Tag> => "Tag" | "tagSet",
        }
    }

    aws_shape! {
        pub struct EbsBlockDevice {
            volume_size: Option<i64> => "VolumeSize" | "volumeSize",
            delete_on_termination: Option<bool> => "DeleteOnTermination" | "deleteOnTermination",
        }
    }

    aws_shape! {
        pub struct BlockDeviceMapping {
            device_name: Option<String> => "DeviceName" | "deviceName",
            ebs: Option<EbsBlockDevice> => "Ebs" | "ebs",
        }
    }

    aws_shape! {
        pub struct LaunchRequest {
            image_id: Option<String> => "ImageId",
            instance_type: Option<String> => "InstanceType",
            min_count: Option<i64> => "MinCount",
            max_count: Option<i64> => "MaxCount",
            security_group_ids: Vec<String> => "SecurityGroupId" | "securityGroupId",
            block_device_mappings: Vec<BlockDeviceMapping> => "BlockDeviceMapping" | "blockDeviceMapping",
            tag_specifications: Vec<TagSpecification> => "TagSpecification",
        }
    }

    fn launch_query() -> QueryMap {
        QueryMap::parse(
            "Action=RunInstances&ImageId=ami-0abcdef1234567890&InstanceType=t2.micro\
             &MinCount=1&MaxCount=1\
             &SecurityGroupId.1=sg-0b0384b66d7d692f9\
             &BlockDeviceMapping.1.DeviceName=%2Fdev%2Fsdh\
             &BlockDeviceMapping.1.Ebs.VolumeSize=100\
             &TagSpecification.1.ResourceType=instance\
             &TagSpecification.1.Tag.1.Key=Name&TagSpecification.1.Tag.1.Value=MyWebServer",
        )
    }

    #[test]
    fn nested_launch_request_decodes() {
        let input: LaunchRequest = decode_args(&launch_query()).unwrap();
        assert_eq!(input.image_id.as_deref(), Some("ami-0abcdef1234567890"));
        assert_eq!(input.min_count, Some(1));
        assert_eq!(input.security_group_ids, vec!["sg-0b0384b66d7d692f9"]);
        assert_eq!(input.block_device_mappings.len(), 1);
        let bdm = &input.block_device_mappings[0];
        assert_eq!(bdm.device_name.as_deref(), Some("/dev/sdh"));
        assert_eq!(bdm.ebs.as_ref().unwrap().volume_size, Some(100));
        assert_eq!(input.tag_specifications.len(), 1);
        let tags = &input.tag_specifications[0].tags;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].key.as_deref(), Some("Name"));
        assert_eq!(tags[0].value.as_deref(), Some("MyWebServer"));
    }

    #[test]
    fn camel_case_spelling_decodes_too() {
        let q = QueryMap::parse(
            "blockDeviceMapping.1.deviceName=%2Fdev%2Fsdh&blockDeviceMapping.1.ebs.volumeSize=8",
        );
        let input: LaunchRequest = decode_args(&q).unwrap();
        assert_eq!(input.block_device_mappings.len(), 1);
        assert_eq!(
            input.block_device_mappings[0].ebs.as_ref().unwrap().volume_size,
            Some(8)
        );
    }

    #[test]
    fn invalid_nested_integer_is_an_error() {
        let q = QueryMap::parse("BlockDeviceMapping.1.Ebs.VolumeSize=large");
        assert!(decode_args::<LaunchRequest>(&q).is_err());
    }

    #[test]
    fn shape_renders_hinted_xml_names() {
        let input: LaunchRequest = decode_args(&launch_query()).unwrap();
        let mut w = XmlWriter::new();
        input.block_device_mappings[0]
            .write_xml(&mut w, "item")
            .unwrap();
        let xml = w.into_string().unwrap();
        assert_eq!(
            xml,
            "<item><deviceName>/dev/sdh</deviceName><ebs><volumeSize>100</volumeSize></ebs></item>"
        );
    }

    #[test]
    fn shape_round_trips_through_bus_json() {
        let input: LaunchRequest = decode_args(&launch_query()).unwrap();
        let json = serde_json::to_string(&input).unwrap();
        let back: LaunchRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }
}
