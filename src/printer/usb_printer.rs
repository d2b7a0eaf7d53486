extern crate log;

use std::time::Duration;
use log::{debug, info, warn};
use rusb::{UsbContext, Context, Device, DeviceHandle, TransferType, Direction};
use crate::{
    Error,
    PrinterModel,
    readback::ReadbackSample
};
use super::Transport;

/// Default time to wait on a bulk transfer before giving up
pub const DEFAULT_USB_TIMEOUT: Duration = Duration::from_secs(5);

/// Bulk endpoints and interface found on a printer
struct Endpoints {
    interface: u8,
    bulk_in: u8,
    bulk_out: u8
}

/// Printer connected through libusb
///
/// The interface is released, and the kernel driver re-attached if it had to be detached, when the printer is dropped.
pub struct UsbPrinter {
    dh: DeviceHandle<Context>,
    interface: u8,
    bulk_in: u8,
    bulk_out: u8,
    kernel_detached: bool,
    /// Time to wait before giving up a bulk transfer
    timeout: Duration
}

impl UsbPrinter {
    /// Opens the first printer speaking `model`'s protocol
    ///
    /// When a serial is given, only a printer reporting that serial number is accepted.
    pub fn open(model: PrinterModel, serial: Option<&str>, timeout: Duration) -> Result<UsbPrinter, Error> {
        UsbPrinter::open_any(&[model], serial, timeout).map(|(_, printer)| printer)
    }

    /// Opens the first printer speaking any of `models`, and tells which one it was
    pub fn open_any(models: &[PrinterModel], serial: Option<&str>, timeout: Duration) -> Result<(PrinterModel, UsbPrinter), Error> {
        let context = Context::new()?;
        let devices = context.devices()?;
        for device in devices.iter() {
            let s = device.device_descriptor()?;
            let model = models.iter().find(|model| {
                model.vp_ids().iter().any(|(vendor_id, product_id)| s.vendor_id() == *vendor_id && s.product_id() == *product_id)
            });
            let model = match model {
                Some(model) => *model,
                None => continue
            };
            let dh = device.open()?;
            if let Some(serial) = serial {
                match dh.read_serial_number_string_ascii(&s) {
                    Ok(found) if found == serial => (),
                    Ok(found) => {
                        debug!("Skipping {} with serial {}", model, found);
                        continue;
                    },
                    Err(e) => {
                        warn!("Could not read the serial number of a {}: {}", model, e);
                        continue;
                    }
                }
            }
            info!("Found {} at bus {} address {}", model, device.bus_number(), device.address());
            return UsbPrinter::claim(&device, dh, timeout).map(|printer| (model, printer));
        }
        // No printer was found with such vid and pid
        let wanted: Vec<String> = models.iter().map(|model| model.to_string()).collect();
        Err(Error::DeviceNotFound(match serial {
            Some(serial) => format!("{} with serial {}", wanted.join(" or "), serial),
            None => wanted.join(" or ")
        }))
    }

    fn claim(device: &Device<Context>, mut dh: DeviceHandle<Context>, timeout: Duration) -> Result<UsbPrinter, Error> {
        let endpoints = find_endpoints(device)?;
        let mut kernel_detached = false;
        if let Ok(active) = dh.kernel_driver_active(endpoints.interface) {
            if active {
                // The kernel is active, we have to detach it
                dh.detach_kernel_driver(endpoints.interface)?;
                kernel_detached = true;
            }
        } else {
            warn!("Could not find out if kernel driver is active, might encounter a problem soon.");
        }
        // Now we claim the interface
        if let Err(e) = dh.claim_interface(endpoints.interface) {
            if kernel_detached {
                let _ = dh.attach_kernel_driver(endpoints.interface);
            }
            return Err(Error::RusbError(e));
        }
        debug!("Claimed interface {}, bulk in {:#04x}, bulk out {:#04x}", endpoints.interface, endpoints.bulk_in, endpoints.bulk_out);
        Ok(UsbPrinter {
            dh,
            interface: endpoints.interface,
            bulk_in: endpoints.bulk_in,
            bulk_out: endpoints.bulk_out,
            kernel_detached,
            timeout
        })
    }
}

/// First interface holding both a bulk in and a bulk out endpoint
fn find_endpoints(device: &Device<Context>) -> Result<Endpoints, Error> {
    let config_descriptor = device.active_config_descriptor()?;
    // Horrible to have 3 nested for, but so be it
    for interface in config_descriptor.interfaces() {
        for descriptor in interface.descriptors() {
            let mut bulk_in = None;
            let mut bulk_out = None;
            for endpoint in descriptor.endpoint_descriptors() {
                match (endpoint.transfer_type(), endpoint.direction()) {
                    (TransferType::Bulk, Direction::In) => if bulk_in.is_none() {
                        bulk_in = Some(endpoint.address());
                    },
                    (TransferType::Bulk, Direction::Out) => if bulk_out.is_none() {
                        bulk_out = Some(endpoint.address());
                    },
                    _ => ()
                }
            }
            if let (Some(bulk_in), Some(bulk_out)) = (bulk_in, bulk_out) {
                return Ok(Endpoints {
                    interface: descriptor.interface_number(),
                    bulk_in,
                    bulk_out
                });
            }
        }
    }
    Err(Error::NoBulkEndpoint)
}

impl Transport for UsbPrinter {
    fn read_status(&mut self, len: usize) -> Result<ReadbackSample, Error> {
        let mut buffer = vec![0u8; len];
        let count = self.dh.read_bulk(self.bulk_in, &mut buffer, self.timeout)?;
        if count != len {
            debug!("Short readback, {} of {} bytes", count, len);
        }
        buffer.truncate(count);
        Ok(ReadbackSample::new(buffer))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        Ok(self.dh.write_bulk(self.bulk_out, bytes, self.timeout)?)
    }
}

impl Drop for UsbPrinter {
    fn drop(&mut self) {
        if let Err(e) = self.dh.release_interface(self.interface) {
            warn!("Could not release interface {}: {}", self.interface, e);
        }
        if self.kernel_detached {
            if let Err(e) = self.dh.attach_kernel_driver(self.interface) {
                warn!("Could not re-attach the kernel driver: {}", e);
            }
        }
    }
}
