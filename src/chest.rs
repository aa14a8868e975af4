use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::{self, MeshData};

/// Swing the lid reaches when the chest is fully open, in radians about x.
pub const LID_OPEN_ANGLE: f32 = -PI * 0.68;

/// Fixed hinge point of the lid group relative to the chest root.
pub const LID_PIVOT: Vec3 = Vec3::new(0.0, 1.1, -1.3);

/// Vertical offset of the whole chest above the ground plane.
pub const ROOT_OFFSET: Vec3 = Vec3::new(0.0, 0.5, 0.0);

const LID_RADIUS: f32 = 1.35;
const BAND_OFFSETS_X: [f32; 2] = [-1.35, 1.35];
const RIVET_OFFSETS_Y: [f32; 2] = [-0.8, 0.8];
const TRIM_OFFSETS_Y: [f32; 2] = [1.05, -1.05];

/// Material reference with fixed optical parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finish {
    Wood,
    Gold,
    Slate,
}

/// Parameters the renderer feeds into its shading model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishParams {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
}

impl Finish {
    pub fn params(self) -> FinishParams {
        match self {
            Finish::Wood => FinishParams {
                color: srgb(0x4a3a2a),
                roughness: 0.68,
                metalness: 0.08,
                emissive: srgb(0x2a1b12),
                emissive_intensity: 0.25,
            },
            Finish::Gold => FinishParams {
                color: srgb(0xf3cf6a),
                roughness: 0.14,
                metalness: 1.0,
                emissive: srgb(0x9b6a10),
                emissive_intensity: 0.5,
            },
            Finish::Slate => FinishParams {
                color: srgb(0x1b1410),
                roughness: 0.9,
                metalness: 0.05,
                emissive: Vec3::ZERO,
                emissive_intensity: 0.0,
            },
        }
    }
}

fn srgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Primitive shape descriptor for one rigid part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32 },
    Cylinder { radius: f32, height: f32 },
    HalfCylinder { radius: f32, height: f32 },
    Filigree { depth: f32, scale: f32 },
}

impl Shape {
    /// Tessellates the shape into renderable geometry. Deterministic for a
    /// given descriptor.
    pub fn tessellate(&self) -> MeshData {
        match *self {
            Shape::Box {
                width,
                height,
                depth,
            } => mesh::box_mesh(width, height, depth),
            Shape::Sphere { radius } => mesh::sphere_mesh(radius, 8, 8),
            Shape::Cylinder { radius, height } => {
                mesh::cylinder_mesh(radius, height, 16, std::f32::consts::TAU)
            }
            Shape::HalfCylinder { radius, height } => mesh::cylinder_mesh(radius, height, 32, PI),
            Shape::Filigree { depth, scale } => {
                let outline = filigree_outline();
                let scaled: Vec<Vec2> = outline.iter().map(|p| *p * scale).collect();
                mesh::extrude_outline(&scaled, depth)
            }
        }
    }
}

/// The two rigid groups of the chest. Only the lid group rotates at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartGroup {
    Base,
    Lid,
}

/// One rigid sub-part with its local transform relative to its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestPart {
    pub name: String,
    pub shape: Shape,
    pub finish: Finish,
    pub group: PartGroup,
    pub translation: Vec3,
    /// Euler rotation in radians, applied z then y then x.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl ChestPart {
    fn new(name: impl Into<String>, shape: Shape, finish: Finish, group: PartGroup) -> Self {
        Self {
            name: name.into(),
            shape,
            finish,
            group,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    fn at(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    fn scaled(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Local transform relative to the owning group.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }
}

/// Immutable model graph of the chest: a static base group plus a hinged lid
/// group whose pivot is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestModel {
    parts: Vec<ChestPart>,
}

impl ChestModel {
    /// Builds the complete chest. Pure and deterministic.
    pub fn build() -> Self {
        let mut parts = Vec::new();

        parts.push(ChestPart::new(
            "body",
            Shape::Box {
                width: 4.0,
                height: 2.2,
                depth: 2.6,
            },
            Finish::Wood,
            PartGroup::Base,
        ));

        // Front slats across the face of the body.
        let mut x = -1.5;
        while x <= 1.5 {
            parts.push(
                ChestPart::new(
                    format!("slat{x:+.1}"),
                    Shape::Box {
                        width: 0.32,
                        height: 1.8,
                        depth: 0.05,
                    },
                    Finish::Slate,
                    PartGroup::Base,
                )
                .at(Vec3::new(x, 0.0, 1.31)),
            );
            x += 0.5;
        }

        for x in BAND_OFFSETS_X {
            parts.push(
                ChestPart::new(
                    format!("band{x:+.2}"),
                    Shape::Box {
                        width: 0.42,
                        height: 2.25,
                        depth: 2.7,
                    },
                    Finish::Gold,
                    PartGroup::Base,
                )
                .at(Vec3::new(x, 0.0, 0.0)),
            );

            for y in RIVET_OFFSETS_Y {
                parts.push(
                    ChestPart::new(
                        format!("rivet{x:+.2}{y:+.1}"),
                        Shape::Sphere { radius: 0.06 },
                        Finish::Gold,
                        PartGroup::Base,
                    )
                    .at(Vec3::new(x, y, 1.35)),
                );
            }
        }

        for y in TRIM_OFFSETS_Y {
            parts.push(
                ChestPart::new(
                    format!("trim{y:+.2}"),
                    Shape::Box {
                        width: 4.1,
                        height: 0.15,
                        depth: 2.7,
                    },
                    Finish::Gold,
                    PartGroup::Base,
                )
                .at(Vec3::new(0.0, y, 0.0)),
            );
        }

        // Lid group: positions are relative to the hinge at LID_PIVOT. The
        // half-cylinders are built around y and rolled onto their side so the
        // flat chord faces down.
        parts.push(
            ChestPart::new(
                "lid",
                Shape::HalfCylinder {
                    radius: LID_RADIUS,
                    height: 4.0,
                },
                Finish::Wood,
                PartGroup::Lid,
            )
            .at(Vec3::new(0.0, 0.0, 1.3))
            .rotated(Vec3::new(0.0, 0.0, PI / 2.0)),
        );

        for x in BAND_OFFSETS_X {
            parts.push(
                ChestPart::new(
                    format!("lid-band{x:+.2}"),
                    Shape::HalfCylinder {
                        radius: LID_RADIUS + 0.04,
                        height: 0.45,
                    },
                    Finish::Gold,
                    PartGroup::Lid,
                )
                .at(Vec3::new(x, 0.0, 1.3))
                .rotated(Vec3::new(0.0, 0.0, PI / 2.0)),
            );
        }

        parts.push(
            ChestPart::new(
                "filigree",
                Shape::Filigree {
                    depth: 0.05,
                    scale: 1.0,
                },
                Finish::Gold,
                PartGroup::Lid,
            )
            .at(Vec3::new(0.0, LID_RADIUS + 0.02, 1.8))
            .rotated(Vec3::new(-PI / 2.0, 0.0, 0.0))
            .scaled(1.2),
        );

        // Lock assembly on the front face, offset above center.
        parts.push(
            ChestPart::new(
                "lock-plate",
                Shape::Box {
                    width: 0.7,
                    height: 0.9,
                    depth: 0.15,
                },
                Finish::Gold,
                PartGroup::Base,
            )
            .at(Vec3::new(0.0, 1.1, 1.4)),
        );
        parts.push(
            ChestPart::new(
                "keyhole",
                Shape::Cylinder {
                    radius: 0.08,
                    height: 0.1,
                },
                Finish::Slate,
                PartGroup::Base,
            )
            .at(Vec3::new(0.0, 1.1, 1.48))
            .rotated(Vec3::new(PI / 2.0, 0.0, 0.0)),
        );

        Self { parts }
    }

    pub fn parts(&self) -> &[ChestPart] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn lid_parts(&self) -> impl Iterator<Item = &ChestPart> {
        self.parts.iter().filter(|p| p.group == PartGroup::Lid)
    }

    /// World transform of a part for the current orbit and lid angles. The
    /// orbit applies to the whole chest; the lid angle only to the lid group,
    /// swinging about the fixed pivot.
    pub fn part_matrix(&self, part: &ChestPart, yaw: f32, pitch: f32, lid_angle: f32) -> Mat4 {
        let root = Mat4::from_translation(ROOT_OFFSET)
            * Mat4::from_rotation_y(yaw)
            * Mat4::from_rotation_x(pitch);
        let group = match part.group {
            PartGroup::Base => Mat4::IDENTITY,
            PartGroup::Lid => Mat4::from_translation(LID_PIVOT) * Mat4::from_rotation_x(lid_angle),
        };
        root * group * part.local_matrix()
    }
}

/// Closed filigree profile sampled from four chained cubic beziers.
fn filigree_outline() -> Vec<Vec2> {
    let mut outline = Vec::new();
    mesh::sample_bezier(
        Vec2::new(0.0, 0.0),
        Vec2::new(0.5, 0.5),
        Vec2::new(1.2, 0.2),
        Vec2::new(1.5, -0.5),
        12,
        &mut outline,
    );
    mesh::sample_bezier(
        Vec2::new(1.5, -0.5),
        Vec2::new(1.2, -1.2),
        Vec2::new(0.5, -0.8),
        Vec2::new(0.0, -0.3),
        12,
        &mut outline,
    );
    mesh::sample_bezier(
        Vec2::new(0.0, -0.3),
        Vec2::new(-0.5, -0.8),
        Vec2::new(-1.2, -1.2),
        Vec2::new(-1.5, -0.5),
        12,
        &mut outline,
    );
    mesh::sample_bezier(
        Vec2::new(-1.5, -0.5),
        Vec2::new(-1.2, 0.2),
        Vec2::new(-0.5, 0.5),
        Vec2::new(0.0, 0.0),
        12,
        &mut outline,
    );
    outline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_deterministic() {
        assert_eq!(ChestModel::build(), ChestModel::build());
    }

    #[test]
    fn part_census_matches_design() {
        let model = ChestModel::build();
        let count = |prefix: &str| {
            model
                .parts()
                .iter()
                .filter(|p| p.name.starts_with(prefix))
                .count()
        };
        assert_eq!(count("slat"), 7);
        assert_eq!(count("band"), 2);
        assert_eq!(count("rivet"), 4);
        assert_eq!(count("trim"), 2);
        assert_eq!(count("lid-band"), 2);
        // body + 7 slats + 2 bands + 4 rivets + 2 trims
        // + lid + 2 lid bands + filigree + plate + keyhole
        assert_eq!(model.part_count(), 22);
    }

    #[test]
    fn lid_group_holds_exactly_the_hinged_parts() {
        let model = ChestModel::build();
        let lid_names: Vec<&str> = model.lid_parts().map(|p| p.name.as_str()).collect();
        assert_eq!(lid_names, ["lid", "lid-band-1.35", "lid-band+1.35", "filigree"]);
    }

    #[test]
    fn every_shape_tessellates_to_geometry() {
        for part in ChestModel::build().parts() {
            let mesh = part.shape.tessellate();
            assert!(mesh.triangle_count() > 0, "{} is empty", part.name);
        }
    }

    #[test]
    fn lid_angle_only_moves_lid_parts() {
        let model = ChestModel::build();
        for part in model.parts() {
            let closed = model.part_matrix(part, 0.0, 0.0, 0.0);
            let open = model.part_matrix(part, 0.0, 0.0, LID_OPEN_ANGLE);
            match part.group {
                PartGroup::Base => assert_eq!(closed, open, "{} moved", part.name),
                PartGroup::Lid => assert_ne!(closed, open, "{} did not move", part.name),
            }
        }
    }

    #[test]
    fn lid_pivot_is_preserved_under_rotation() {
        let model = ChestModel::build();
        let lid = model.parts().iter().find(|p| p.name == "lid").unwrap();
        // A point on the hinge axis must stay fixed for any lid angle.
        let hinge_local = lid.local_matrix().inverse() * Vec3::ZERO.extend(1.0);
        let closed = model.part_matrix(lid, 0.0, 0.0, 0.0) * hinge_local;
        let open = model.part_matrix(lid, 0.0, 0.0, LID_OPEN_ANGLE) * hinge_local;
        assert!((closed - open).length() < 1e-4);
    }

    #[test]
    fn finishes_expose_fixed_optical_parameters() {
        let gold = Finish::Gold.params();
        assert_eq!(gold.metalness, 1.0);
        assert!(gold.emissive_intensity > 0.0);
        let slate = Finish::Slate.params();
        assert_eq!(slate.emissive, Vec3::ZERO);
    }
}
