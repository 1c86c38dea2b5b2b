use anyhow::Result;

use deimos::prelude::*;
use deimos::vk;

fn family(flags: vk::QueueFlags, can_present: bool, count: u32) -> QueueFamilyInfo {
    QueueFamilyInfo {
        flags,
        can_present,
        count,
    }
}

#[test]
pub fn combined_family_serves_every_role() -> Result<()> {
    // One family exposing graphics, compute, transfer and present with a single
    // queue: all four roles land on (0, 0) and a single queue-create record
    // with count 1 is requested.
    let families = [family(
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        true,
        1,
    )];
    let assignment = QueueAssignment::new(&families)?;

    let origin = QueueSlot {
        family: 0,
        index: 0,
    };
    assert_eq!(assignment.graphics, origin);
    assert_eq!(assignment.compute, origin);
    assert_eq!(assignment.transfer, origin);
    assert_eq!(assignment.present, origin);
    assert_eq!(
        assignment.create_records(),
        vec![QueueCreateRecord {
            family: 0,
            count: 1,
        }]
    );
    Ok(())
}

#[test]
pub fn no_role_is_ever_left_unassigned() -> Result<()> {
    let layouts: Vec<Vec<QueueFamilyInfo>> = vec![
        vec![family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true, 1)],
        vec![
            family(vk::QueueFlags::GRAPHICS, true, 2),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, false, 4),
        ],
        vec![
            family(vk::QueueFlags::TRANSFER, false, 1),
            family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                false,
                8,
            ),
            family(vk::QueueFlags::empty(), true, 1),
        ],
    ];

    for families in layouts {
        let assignment = QueueAssignment::new(&families)?;
        for slot in [
            assignment.graphics,
            assignment.compute,
            assignment.transfer,
            assignment.present,
        ] {
            let info = families[slot.family as usize];
            assert!(slot.index < info.count, "queue index out of range");
        }
    }
    Ok(())
}

#[test]
pub fn fallback_aliases_the_graphics_pair() -> Result<()> {
    // Graphics-only device: compute, transfer and present all fall back to the
    // graphics (family, queue) pair rather than being left unusable.
    let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true, 1)];
    let assignment = QueueAssignment::new(&families)?;
    assert_eq!(assignment.compute, assignment.graphics);
    assert_eq!(assignment.transfer, assignment.graphics);
    assert_eq!(assignment.present, assignment.graphics);
    Ok(())
}

#[test]
pub fn one_record_per_distinct_family_in_use() -> Result<()> {
    let families = [
        family(vk::QueueFlags::GRAPHICS, true, 1),
        family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, false, 2),
    ];
    let assignment = QueueAssignment::new(&families)?;
    // Two families in use: graphics+present on family 0, compute and transfer
    // on distinct queues of family 1. Records are per family, not per role.
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
    Ok(())
}

#[test]
pub fn missing_graphics_family_fails() {
    let families = [family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, true, 4)];
    assert!(QueueAssignment::new(&families).is_err());
}
