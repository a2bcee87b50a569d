pub mod rendering_control;

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::{
        binding::ServiceDefinition,
        codegen::{render_with, RenderOptions},
        service::KnownService,
        service_client::tests::{envelope, StubTransport},
    };

    use super::rendering_control::{
        GetVolumeRequest, RenderingControl, RenderingControlEvent, SetMuteRequest,
    };

    const RENDERING_CONTROL: &[u8] = include_bytes!("../../fixtures/RenderingControl.xml");

    #[test]
    fn committed_rendering_control_is_fresh() {
        let definition = ServiceDefinition::from_xml(
            KnownService::RenderingControl.descriptor(),
            RENDERING_CONTROL,
        )
        .unwrap();
        let options = RenderOptions {
            runtime: "crate".to_owned(),
        };
        let source = render_with(&definition, &options).unwrap();
        assert_eq!(source, include_str!("rendering_control.rs"));
    }

    fn renderer(transport: StubTransport) -> RenderingControl<StubTransport> {
        let base = Url::parse("http://192.168.1.20:1400/xml/device_description.xml").unwrap();
        RenderingControl::new(transport, &base).unwrap()
    }

    #[tokio::test]
    async fn typed_get_volume() {
        let service = renderer(StubTransport::replying(envelope(
            r#"<u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>42</CurrentVolume></u:GetVolumeResponse>"#,
        )));
        let response = service
            .get_volume(&GetVolumeRequest {
                instance_id: 0,
                channel: "Master".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.current_volume, 42);
        assert_eq!(
            service.client().control_url().as_str(),
            "http://192.168.1.20:1400/MediaRenderer/RenderingControl/Control"
        );
    }

    #[tokio::test]
    async fn typed_set_mute_writes_boolean() {
        let transport = StubTransport::replying(envelope(
            r#"<u:SetMuteResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"/>"#,
        ));
        let sent = transport.requests.clone();
        let service = renderer(transport);
        service
            .set_mute(&SetMuteRequest {
                instance_id: 0,
                channel: "Master".into(),
                desired_mute: true,
            })
            .await
            .unwrap();
        let requests = sent.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].body.contains("<DesiredMute>1</DesiredMute>"));
        assert_eq!(
            requests[0].header("SOAPAction"),
            Some("urn:schemas-upnp-org:service:RenderingControl:1#SetMute")
        );
    }

    #[test]
    fn typed_last_change_event() {
        let service = renderer(StubTransport::unreachable());
        let events = service.parse_event(
            br#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
<e:property><LastChange>&lt;Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"&gt;&lt;InstanceID val="0"&gt;&lt;Volume channel="Master" val="12"/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange></e:property>
</e:propertyset>"#,
        );
        let expected = r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"><InstanceID val="0"><Volume channel="Master" val="12"/></InstanceID></Event>"#;
        assert_eq!(
            events,
            [RenderingControlEvent::LastChange(expected.to_owned())]
        );
        assert_eq!(service.state().last_change.as_deref(), Some(expected));
    }
}
