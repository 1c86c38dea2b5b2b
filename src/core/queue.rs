//! Queue role assignment. Maps the four renderer roles (graphics, compute,
//! transfer, present) onto concrete queue family/queue indices of the selected
//! device, with minimal-duplication fallback rules.

use anyhow::Result;
use ash::vk;

use crate::core::error::Error;
use crate::core::physical_device::QueueFamilyInfo;
use crate::Device;

/// A concrete (queue family, queue index) pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct QueueSlot {
    pub family: u32,
    pub index: u32,
}

/// One queue-create request per distinct family actually used, with `count`
/// equal to the number of distinct queue indices assigned within that family.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueCreateRecord {
    pub family: u32,
    pub count: u32,
}

/// The resolved role mapping. After construction every role holds a valid slot:
/// compute, transfer and present alias the graphics pair whenever no dedicated
/// family or queue was available for them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueAssignment {
    pub graphics: QueueSlot,
    pub compute: QueueSlot,
    pub transfer: QueueSlot,
    pub present: QueueSlot,
}

impl QueueAssignment {
    /// Assigns the four roles, processing families in index order.
    ///
    /// The first family offering graphics becomes the graphics family
    /// (first-fit). Spare queue slots in that family are dedicated to compute
    /// and transfer before other families are consulted. Present prefers the
    /// graphics family when it can present; otherwise the first presenting
    /// family with other capabilities, and a present-only family as last
    /// resort.
    pub fn new(families: &[QueueFamilyInfo]) -> Result<Self> {
        let mut graphics = None;
        let mut compute = None;
        let mut transfer = None;
        let mut present = None;

        for (index, family) in families.iter().enumerate() {
            if !family.flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            let family_index = index as u32;
            graphics = Some(QueueSlot {
                family: family_index,
                index: 0,
            });
            // Dedicate additional queues of this family while slots remain.
            let mut next = 1;
            if family.flags.contains(vk::QueueFlags::COMPUTE) && next < family.count {
                compute = Some(QueueSlot {
                    family: family_index,
                    index: next,
                });
                next += 1;
            }
            if family.flags.contains(vk::QueueFlags::TRANSFER) && next < family.count {
                transfer = Some(QueueSlot {
                    family: family_index,
                    index: next,
                });
            }
            break;
        }
        let graphics = graphics.ok_or(Error::NoGraphicsQueue)?;

        // Roles still missing take the first other family that offers them,
        // packing compute and transfer onto distinct indices when one family
        // serves both.
        for (index, family) in families.iter().enumerate() {
            let family_index = index as u32;
            if family_index == graphics.family {
                continue;
            }
            let mut next = 0;
            if compute.is_none() && family.flags.contains(vk::QueueFlags::COMPUTE) && next < family.count {
                compute = Some(QueueSlot {
                    family: family_index,
                    index: next,
                });
                next += 1;
            }
            if transfer.is_none() && family.flags.contains(vk::QueueFlags::TRANSFER) && next < family.count {
                transfer = Some(QueueSlot {
                    family: family_index,
                    index: next,
                });
            }
        }

        if families[graphics.family as usize].can_present {
            present = Some(graphics);
        } else {
            let candidate = families
                .iter()
                .enumerate()
                .find(|(_, family)| family.can_present && !family.flags.is_empty())
                .or_else(|| families.iter().enumerate().find(|(_, family)| family.can_present));
            if let Some((index, _)) = candidate {
                let family_index = index as u32;
                // Reuse a queue already requested in that family rather than
                // asking the driver for another one.
                let alias = [compute, transfer]
                    .iter()
                    .flatten()
                    .find(|slot| slot.family == family_index)
                    .copied();
                present = Some(alias.unwrap_or(QueueSlot {
                    family: family_index,
                    index: 0,
                }));
            }
        }

        Ok(QueueAssignment {
            graphics,
            compute: compute.unwrap_or(graphics),
            transfer: transfer.unwrap_or(graphics),
            present: present.unwrap_or(graphics),
        })
    }

    /// The queue-create requests this assignment needs, one per distinct family,
    /// ordered by family index.
    pub fn create_records(&self) -> Vec<QueueCreateRecord> {
        let mut slots = [self.graphics, self.compute, self.transfer, self.present];
        slots.sort();
        let mut records: Vec<QueueCreateRecord> = Vec::new();
        let mut previous = None;
        for slot in slots {
            if previous == Some(slot) {
                continue;
            }
            previous = Some(slot);
            match records.last_mut() {
                Some(record) if record.family == slot.family => record.count += 1,
                _ => records.push(QueueCreateRecord {
                    family: slot.family,
                    count: 1,
                }),
            }
        }
        records
    }
}

/// A queue handle retrieved from the logical device. The handle is owned by the
/// device; this is a non-owning view tagged with its slot.
#[derive(Copy, Clone, Debug)]
pub struct Queue {
    handle: vk::Queue,
    slot: QueueSlot,
}

impl Queue {
    /// Obtain the raw vulkan handle of the queue.
    pub unsafe fn handle(&self) -> vk::Queue {
        self.handle
    }

    pub fn family(&self) -> u32 {
        self.slot.family
    }

    pub fn index(&self) -> u32 {
        self.slot.index
    }
}

/// The four role queues of a negotiated device. Handles may alias when roles
/// fell back to the graphics pair.
#[derive(Copy, Clone, Debug)]
pub struct DeviceQueues {
    pub graphics: Queue,
    pub compute: Queue,
    pub transfer: Queue,
    pub present: Queue,
}

impl DeviceQueues {
    /// Retrieves the queue handles for a resolved assignment from a created
    /// logical device.
    pub fn fetch(device: &Device, assignment: &QueueAssignment) -> Self {
        let fetch_slot = |slot: QueueSlot| Queue {
            handle: unsafe { device.get_device_queue(slot.family, slot.index) },
            slot,
        };
        DeviceQueues {
            graphics: fetch_slot(assignment.graphics),
            compute: fetch_slot(assignment.compute),
            transfer: fetch_slot(assignment.transfer),
            present: fetch_slot(assignment.present),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, can_present: bool, count: u32) -> QueueFamilyInfo {
        QueueFamilyInfo {
            flags,
            can_present,
            count,
        }
    }

    #[test]
    fn spare_graphics_family_queues_serve_compute_and_transfer() {
        let families = vec![family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            true,
            3,
        )];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.graphics, QueueSlot { family: 0, index: 0 });
        assert_eq!(assignment.compute, QueueSlot { family: 0, index: 1 });
        assert_eq!(assignment.transfer, QueueSlot { family: 0, index: 2 });
        assert_eq!(assignment.present, assignment.graphics);
        assert_eq!(
            assignment.create_records(),
            vec![QueueCreateRecord {
                family: 0,
                count: 3,
            }]
        );
    }

    #[test]
    fn first_graphics_family_wins() {
        let families = vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true, 1),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true, 8),
        ];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.graphics.family, 0);
    }

    #[test]
    fn dedicated_families_are_used_before_aliasing() {
        let families = vec![
            family(vk::QueueFlags::GRAPHICS, true, 1),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, false, 2),
        ];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.compute, QueueSlot { family: 1, index: 0 });
        assert_eq!(assignment.transfer, QueueSlot { family: 1, index: 1 });
        assert_eq!(
            assignment.create_records(),
            vec![
                QueueCreateRecord {
                    family: 0,
                    count: 1,
                },
                QueueCreateRecord {
                    family: 1,
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn shared_dedicated_family_with_one_queue_leaves_transfer_on_graphics() {
        let families = vec![
            family(vk::QueueFlags::GRAPHICS, true, 1),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, false, 1),
        ];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.compute, QueueSlot { family: 1, index: 0 });
        assert_eq!(assignment.transfer, assignment.graphics);
    }

    #[test]
    fn present_prefers_capable_family_over_present_only_one() {
        let families = vec![
            family(vk::QueueFlags::GRAPHICS, false, 1),
            family(vk::QueueFlags::COMPUTE, true, 1),
            family(vk::QueueFlags::empty(), true, 1),
        ];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.present, QueueSlot { family: 1, index: 0 });
        // Present aliases the compute queue in that family instead of
        // requesting a second one.
        assert_eq!(assignment.present, assignment.compute);
    }

    #[test]
    fn present_only_family_is_last_resort() {
        let families = vec![
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, false, 1),
            family(vk::QueueFlags::empty(), true, 1),
        ];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.present, QueueSlot { family: 1, index: 0 });
    }

    #[test]
    fn every_role_aliases_graphics_when_nothing_else_exists() {
        let families = vec![family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
            true,
            1,
        )];
        let assignment = QueueAssignment::new(&families).unwrap();
        assert_eq!(assignment.compute, assignment.graphics);
        assert_eq!(assignment.transfer, assignment.graphics);
        assert_eq!(assignment.present, assignment.graphics);
        assert_eq!(
            assignment.create_records(),
            vec![QueueCreateRecord {
                family: 0,
                count: 1,
            }]
        );
    }

    #[test]
    fn missing_graphics_support_is_fatal() {
        let families = vec![family(vk::QueueFlags::COMPUTE, true, 1)];
        let err = QueueAssignment::new(&families).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NoGraphicsQueue)
        ));
    }
}
