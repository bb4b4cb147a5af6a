//! EC2 `2011-07-15` response documents.
//!
//! Every schema element is always present; elements with no VDC counterpart
//! are emitted empty.

use super::{
    xml::{document, Element},
    Outcome, XMLNS,
};
use crate::vdc::{ImageRecord, InstanceRecord};

pub fn render(outcome: &Outcome, hypervisor: &str) -> String {
    match outcome {
        Outcome::RunInstances {
            account_id,
            instances,
        } => run_instances(account_id, instances, hypervisor),
        Outcome::TerminateInstances { instance_ids } => terminate_instances(instance_ids),
        Outcome::DescribeInstances {
            account_id,
            instances,
        } => describe_instances(account_id, instances, hypervisor),
        Outcome::DescribeImages { images } => describe_images(images, hypervisor),
    }
}

fn response(name: &'static str) -> Element {
    Element::new(name)
        .attr("xmlns", XMLNS)
        .child(Element::new("requestId"))
}

fn group_set(groups: &[String]) -> Element {
    Element::new("groupSet").children(groups.iter().map(|group| {
        Element::new("item")
            .child(Element::new("groupId"))
            .child(Element::leaf("groupName", Some(group.as_str())))
    }))
}

fn state(name: &'static str, value: Option<&str>) -> Element {
    Element::new(name)
        .child(Element::new("code"))
        .child(Element::leaf("name", value))
}

fn launched_instance(instance: &InstanceRecord, hypervisor: &str) -> Element {
    Element::new("item")
        .child(Element::leaf("instanceId", instance.id.as_deref()))
        .child(Element::leaf("imageId", instance.image_id.as_deref()))
        .child(state("instanceState", instance.status.as_deref()))
        .child(Element::new("privateDnsName"))
        .child(Element::new("dnsName"))
        .child(Element::leaf("keyName", instance.ssh_key_pair.as_deref()))
        .child(Element::new("amiLaunchIndex"))
        .child(Element::new("instanceType"))
        .child(Element::leaf("launchTime", instance.created_at.as_deref()))
        .child(Element::new("placement").child(Element::new("availabilityZone")))
        .child(Element::new("monitoring").child(Element::new("enabled")))
        .child(Element::new("sourceDestCheck"))
        .child(group_set(instance.groups()))
        .child(Element::new("virtualizationType"))
        .child(Element::void("clientToken"))
        .child(Element::void("tagSet"))
        .child(Element::leaf("hypervisor", Some(hypervisor)))
}

pub fn run_instances(account_id: &str, instances: &[InstanceRecord], hypervisor: &str) -> String {
    // The reservation-level groups are those of the first instance.
    let groups = instances.first().map(InstanceRecord::groups).unwrap_or_default();
    let root = response("RunInstancesResponse")
        .child(Element::new("reservationId"))
        .child(Element::leaf("ownerId", Some(account_id)))
        .child(group_set(groups))
        .child(
            Element::new("instancesSet").children(
                instances
                    .iter()
                    .map(|instance| launched_instance(instance, hypervisor)),
            ),
        );
    document(&root)
}

pub fn terminate_instances(instance_ids: &[String]) -> String {
    let root = response("TerminateInstancesResponse").child(
        Element::new("instancesSet").children(instance_ids.iter().map(|id| {
            Element::new("item")
                .child(Element::leaf("instanceId", Some(id.as_str())))
                .child(state("currentState", None))
                .child(state("previousState", None))
        })),
    );
    document(&root)
}

fn described_instance(instance: &InstanceRecord, hypervisor: &str) -> Element {
    let ipv4 = instance.primary_ipv4();
    let address = ipv4.and_then(|ip| ip.address.as_deref());
    let nat_address = ipv4.and_then(|ip| ip.nat_address.as_deref());

    Element::new("item")
        .child(Element::leaf("instanceId", instance.id.as_deref()))
        .child(Element::leaf("imageId", instance.image_id.as_deref()))
        .child(state("instanceState", instance.status.as_deref()))
        .child(Element::leaf("privateDnsName", address))
        .child(Element::leaf("dnsName", nat_address))
        .child(Element::new("reason"))
        .child(Element::leaf("keyName", instance.ssh_key_pair.as_deref()))
        .child(Element::new("amiLaunchIndex"))
        .child(Element::void("productCodes"))
        .child(Element::leaf("instanceType", instance.instance_spec_id.as_deref()))
        .child(Element::leaf("launchTime", instance.created_at.as_deref()))
        .child(
            Element::new("placement")
                .child(Element::leaf("availabilityZone", instance.host_node.as_deref())),
        )
        .child(Element::new("kernelId"))
        .child(Element::new("ramdiskId"))
        .child(Element::new("monitoring").child(Element::new("state")))
        .child(Element::leaf("privateIpAddress", address))
        .child(Element::leaf("ipAddress", nat_address))
        .child(group_set(instance.groups()))
        .child(Element::new("architecture"))
        .child(Element::new("rootDeviceType"))
        .child(Element::new("rootDeviceName"))
        .child(Element::void("blockDeviceMapping"))
        .child(Element::new("virtualizationType"))
        .child(Element::void("clientToken"))
        .child(Element::void("tagSet"))
        .child(Element::leaf("hypervisor", Some(hypervisor)))
}

pub fn describe_instances(
    account_id: &str,
    instances: &[InstanceRecord],
    hypervisor: &str,
) -> String {
    let reservations = instances.iter().map(|instance| {
        Element::new("item")
            .child(Element::new("reservationId"))
            .child(Element::leaf("ownerId", Some(account_id)))
            .child(group_set(instance.groups()))
            .child(Element::new("instancesSet").child(described_instance(instance, hypervisor)))
            .child(Element::new("requesterId"))
    });
    let root = response("DescribeInstancesResponse")
        .child(Element::new("reservationSet").children(reservations));
    document(&root)
}

pub fn describe_images(images: &[ImageRecord], hypervisor: &str) -> String {
    let items = images.iter().map(|image| {
        Element::new("item")
            .child(Element::leaf("imageId", image.id.as_deref()))
            .child(Element::leaf("imageLocation", image.source.as_deref()))
            .child(Element::leaf("imageState", image.state.as_deref()))
            .child(Element::leaf("imageOwnerId", image.account_id.as_deref()))
            .child(Element::leaf("isPublic", image.is_public.as_deref()))
            .child(Element::leaf("architecture", image.arch.as_deref()))
            .child(Element::new("imageType"))
            .child(Element::new("kernelId"))
            .child(Element::new("ramdiskId"))
            .child(Element::new("imageOwnerAlias"))
            .child(Element::new("name"))
            .child(Element::leaf("description", image.description.as_deref()))
            .child(Element::new("rootDeviceType"))
            .child(Element::new("rootDeviceName"))
            .child(Element::void("blockDeviceMapping"))
            .child(Element::new("virtualizationType"))
            .child(Element::void("tagSet"))
            .child(Element::leaf("hypervisor", Some(hypervisor)))
    });
    let root = response("DescribeImagesResponse").child(Element::new("imagesSet").children(items));
    document(&root)
}

/// The EC2 error envelope.
pub fn error_response(code: &str, message: &str) -> String {
    let root = Element::new("Response")
        .child(
            Element::new("Errors").child(
                Element::new("Error")
                    .child(Element::leaf("Code", Some(code)))
                    .child(Element::leaf("Message", Some(message))),
            ),
        )
        .child(Element::new("RequestID"));
    document(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> InstanceRecord {
        serde_json::from_value(json!({
            "id": "i-1a2b3c4d",
            "image_id": "wmi-lucid0",
            "status": "running",
            "created_at": "2011-08-10T10:11:12Z",
            "ssh_key_pair": "demo",
            "instance_spec_id": "is-demospec",
            "host_node": "hn-demo1",
            "netfilter_group": ["default", "web"],
            "vif": [{"ipv4": {"address": "10.0.0.5", "nat_address": "192.0.2.5"}}],
        }))
        .unwrap()
    }

    fn between<'a>(doc: &'a str, open: &str, close: &str) -> &'a str {
        let start = doc.find(open).unwrap() + open.len();
        let end = start + doc[start..].find(close).unwrap();
        &doc[start..end]
    }

    #[test]
    fn test_run_instances_document() {
        let doc = run_instances("a-shpoolxx", &[fixture()], "kvm");
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<RunInstancesResponse xmlns="http://ec2.amazonaws.com/doc/2011-07-15/">
  <requestId></requestId>
  <reservationId></reservationId>
  <ownerId>a-shpoolxx</ownerId>
  <groupSet>
    <item>
      <groupId></groupId>
      <groupName>default</groupName>
    </item>
    <item>
      <groupId></groupId>
      <groupName>web</groupName>
    </item>
  </groupSet>
  <instancesSet>
    <item>
      <instanceId>i-1a2b3c4d</instanceId>
      <imageId>wmi-lucid0</imageId>
      <instanceState>
        <code></code>
        <name>running</name>
      </instanceState>
      <privateDnsName></privateDnsName>
      <dnsName></dnsName>
      <keyName>demo</keyName>
      <amiLaunchIndex></amiLaunchIndex>
      <instanceType></instanceType>
      <launchTime>2011-08-10T10:11:12Z</launchTime>
      <placement>
        <availabilityZone></availabilityZone>
      </placement>
      <monitoring>
        <enabled></enabled>
      </monitoring>
      <sourceDestCheck></sourceDestCheck>
      <groupSet>
        <item>
          <groupId></groupId>
          <groupName>default</groupName>
        </item>
        <item>
          <groupId></groupId>
          <groupName>web</groupName>
        </item>
      </groupSet>
      <virtualizationType></virtualizationType>
      <clientToken/>
      <tagSet/>
      <hypervisor>kvm</hypervisor>
    </item>
  </instancesSet>
</RunInstancesResponse>
"#;
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_run_instances_group_order() {
        let doc = run_instances("a-1", &[fixture()], "kvm");
        let groups = between(&doc, "<ownerId>a-1</ownerId>\n  <groupSet>", "</groupSet>");
        assert_eq!(groups.matches("<item>").count(), 2);
        assert!(groups.find("default").unwrap() < groups.find("web").unwrap());
    }

    #[test]
    fn test_run_instances_empty() {
        let doc = run_instances("a-1", &[], "kvm");
        assert!(doc.contains("  <groupSet></groupSet>\n"));
        assert!(doc.contains("  <instancesSet></instancesSet>\n"));
        assert!(!doc.contains("<item>"));
        assert!(doc.ends_with("</RunInstancesResponse>\n"));
    }

    #[test]
    fn test_run_instances_missing_fields() {
        let doc = run_instances("a-1", &[InstanceRecord::default()], "xen");
        assert!(doc.contains("<instanceId></instanceId>"));
        assert!(doc.contains("<name></name>"));
        assert!(doc.contains("<hypervisor>xen</hypervisor>"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let outcome = Outcome::DescribeInstances {
            account_id: "a-1".to_string(),
            instances: vec![fixture(), InstanceRecord::default()],
        };
        assert_eq!(render(&outcome, "kvm"), render(&outcome, "kvm"));
    }

    #[test]
    fn test_terminate_instances() {
        let doc = terminate_instances(&["i-a".to_string(), "i-b".to_string()]);
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<TerminateInstancesResponse xmlns="http://ec2.amazonaws.com/doc/2011-07-15/">
  <requestId></requestId>
  <instancesSet>
    <item>
      <instanceId>i-a</instanceId>
      <currentState>
        <code></code>
        <name></name>
      </currentState>
      <previousState>
        <code></code>
        <name></name>
      </previousState>
    </item>
    <item>
      <instanceId>i-b</instanceId>
      <currentState>
        <code></code>
        <name></name>
      </currentState>
      <previousState>
        <code></code>
        <name></name>
      </previousState>
    </item>
  </instancesSet>
</TerminateInstancesResponse>
"#;
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_describe_instances_addresses() {
        let doc = describe_instances("a-1", &[fixture()], "kvm");
        assert_eq!(doc.matches("<reservationId></reservationId>").count(), 1);
        assert!(doc.contains("<privateDnsName>10.0.0.5</privateDnsName>"));
        assert!(doc.contains("<privateIpAddress>10.0.0.5</privateIpAddress>"));
        assert!(doc.contains("<dnsName>192.0.2.5</dnsName>"));
        assert!(doc.contains("<ipAddress>192.0.2.5</ipAddress>"));
        assert!(doc.contains("<instanceType>is-demospec</instanceType>"));
        assert!(doc.contains("<availabilityZone>hn-demo1</availabilityZone>"));
        assert!(doc.contains("<ownerId>a-1</ownerId>"));
    }

    #[test]
    fn test_describe_instances_without_interfaces() {
        let mut instance = fixture();
        instance.vif = Some(vec![]);
        let other = InstanceRecord {
            id: Some("i-2".to_string()),
            ..Default::default()
        };
        let doc = describe_instances("a-1", &[instance, other], "kvm");

        assert_eq!(doc.matches("<privateDnsName></privateDnsName>").count(), 2);
        assert_eq!(doc.matches("<ipAddress></ipAddress>").count(), 2);
        assert_eq!(doc.matches("<requesterId></requesterId>").count(), 2);
        assert!(doc.find("i-1a2b3c4d").unwrap() < doc.find("<instanceId>i-2<").unwrap());
    }

    #[test]
    fn test_describe_instances_empty() {
        let doc = describe_instances("a-1", &[], "kvm");
        assert!(doc.contains("  <reservationSet></reservationSet>\n"));
    }

    #[test]
    fn test_describe_images() {
        let images: Vec<ImageRecord> = serde_json::from_value(json!([
            {"id": "wmi-lucid0", "source": "http://example/lucid0", "state": "init",
             "account_id": "a-shpoolxx", "is_public": true, "arch": "x86_64",
             "description": "ubuntu & friends"},
            {"id": "wmi-lucid1"},
        ]))
        .unwrap();
        let doc = describe_images(&images, "kvm");

        assert_eq!(doc.matches("<hypervisor>kvm</hypervisor>").count(), 2);
        let first = between(&doc, "<imagesSet>", "</item>");
        assert!(first.contains("<imageId>wmi-lucid0</imageId>"));
        assert!(first.contains("<imageLocation>http://example/lucid0</imageLocation>"));
        assert!(first.contains("<isPublic>true</isPublic>"));
        assert!(first.contains("<description>ubuntu &amp; friends</description>"));
        assert!(doc.contains("<imageLocation></imageLocation>"));
        assert!(describe_images(&[], "kvm").contains("  <imagesSet></imagesSet>\n"));
    }

    #[test]
    fn test_error_response() {
        assert_eq!(
            error_response("Unavailable", "VDC <down>"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Response>\n\
             \x20 <Errors>\n\
             \x20   <Error>\n\
             \x20     <Code>Unavailable</Code>\n\
             \x20     <Message>VDC &lt;down&gt;</Message>\n\
             \x20   </Error>\n\
             \x20 </Errors>\n\
             \x20 <RequestID></RequestID>\n\
             </Response>\n"
        );
    }
}
