//! Recovery portal: a SoftAP with a minimal status page.
//!
//! Started by the feedback hook when the hold check triggers. The device
//! stays in this mode until it is reflashed or rebooted.

use embedded_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::{EspIOError, Write};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

const AP_SSID: &str = "Gatebox-Recovery";
const AP_PASSWORD: &str = "gatebox2026";
const SERVER_STACK_SIZE: usize = 8 * 1024;

const PORTAL_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Gatebox recovery</title></head>\
<body><h1>Gatebox G2 recovery mode</h1>\
<p>The device is waiting for a new firmware image.</p>\
</body></html>";

pub struct RecoveryPortal {
    _wifi: BlockingWifi<EspWifi<'static>>,
    _server: EspHttpServer<'static>,
}

impl RecoveryPortal {
    pub fn start(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspIOError> {
        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sys_loop.clone(), Some(nvs))?,
            sys_loop,
        )?;

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: AP_SSID.try_into().unwrap_or_default(),
            password: AP_PASSWORD.try_into().unwrap_or_default(),
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        }))?;
        wifi.start()?;
        wifi.wait_netif_up()?;

        let mut server = EspHttpServer::new(&HttpConfiguration {
            stack_size: SERVER_STACK_SIZE,
            ..Default::default()
        })?;

        server.fn_handler::<(), _>("/", Method::Get, |req| {
            let mut resp = req.into_ok_response().map_err(|_| ())?;
            let _ = resp.write_all(PORTAL_PAGE.as_bytes());
            Ok(())
        })?;

        server.fn_handler::<(), _>("/api/status", Method::Get, |req| {
            let mut resp = req.into_ok_response().map_err(|_| ())?;
            let _ = resp.write_all(b"{\"ok\":true,\"mode\":\"recovery\"}");
            Ok(())
        })?;

        log::info!("recovery portal up on AP '{}'", AP_SSID);

        Ok(Self {
            _wifi: wifi,
            _server: server,
        })
    }
}
