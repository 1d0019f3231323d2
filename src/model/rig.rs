use glam::{Mat4, Quat, Vec3};

/// Upper bound of the joint palette uploaded to the skinning shader.
pub const MAX_JOINTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct RigNode {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub rest: Transform,
}

/// Local transforms of every rig node for one frame.
#[derive(Debug, Clone)]
pub struct Pose {
    pub locals: Vec<Transform>,
}

/// Node hierarchy plus the skin that binds mesh vertices to it.
#[derive(Debug, Clone)]
pub struct Rig {
    nodes: Vec<RigNode>,
    // parents before children
    order: Vec<usize>,
    joints: Vec<usize>,
    inverse_bind: Vec<Mat4>,
}

impl Rig {
    /// `joints[i]` is the node driving joint `i`; missing inverse bind
    /// matrices default to identity.
    pub fn new(nodes: Vec<RigNode>, joints: Vec<usize>, mut inverse_bind: Vec<Mat4>) -> Self {
        inverse_bind.resize(joints.len(), Mat4::IDENTITY);

        let depth = |mut idx: usize| {
            let mut d = 0;
            while let Some(parent) = nodes[idx].parent {
                d += 1;
                idx = parent;
                if d > nodes.len() {
                    tracing::warn!("cycle in node hierarchy at node {}", idx);
                    break;
                }
            }
            d
        };
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by_key(|&i| depth(i));

        Self { nodes, order, joints, inverse_bind }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn nodes(&self) -> &[RigNode] {
        &self.nodes
    }

    pub fn rest_pose(&self) -> Pose {
        Pose { locals: self.nodes.iter().map(|n| n.rest).collect() }
    }

    pub fn reset_pose(&self, pose: &mut Pose) {
        pose.locals.clear();
        pose.locals.extend(self.nodes.iter().map(|n| n.rest));
    }

    /// Model-space matrix of every node.
    pub fn world_matrices(&self, pose: &Pose) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        for &idx in &self.order {
            let local = pose.locals.get(idx).copied().unwrap_or(self.nodes[idx].rest).matrix();
            world[idx] = match self.nodes[idx].parent {
                Some(parent) => world[parent] * local,
                None => local,
            };
        }
        world
    }

    /// Skinning matrices: `world(joint) * inverse_bind(joint)`.
    pub fn joint_palette(&self, pose: &Pose) -> Vec<Mat4> {
        let world = self.world_matrices(pose);
        self.joints
            .iter()
            .zip(&self.inverse_bind)
            .take(MAX_JOINTS)
            .map(|(&node, inv_bind)| match world.get(node) {
                Some(w) => *w * *inv_bind,
                None => Mat4::IDENTITY,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<RigNode> {
        vec![
            RigNode {
                name: Some("root".into()),
                parent: None,
                rest: Transform { translation: Vec3::new(0.0, 1.0, 0.0), ..Transform::IDENTITY },
            },
            // Declared before its parent on purpose
            RigNode {
                name: Some("tip".into()),
                parent: Some(2),
                rest: Transform { translation: Vec3::new(0.0, 0.0, 1.0), ..Transform::IDENTITY },
            },
            RigNode {
                name: Some("mid".into()),
                parent: Some(0),
                rest: Transform {
                    translation: Vec3::new(1.0, 0.0, 0.0),
                    rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                    scale: Vec3::ONE,
                },
            },
        ]
    }

    #[test]
    fn test_world_matrices_follow_hierarchy() {
        let rig = Rig::new(chain(), vec![], vec![]);
        let world = rig.world_matrices(&rig.rest_pose());
        let tip = world[1].transform_point3(Vec3::ZERO);
        // mid at (1,1,0) rotated 90 degrees about Y sends local +Z to +X
        assert!((tip - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_palette_is_identity_in_bind_pose() {
        let nodes = chain();
        let rest_rig = Rig::new(nodes.clone(), vec![], vec![]);
        let world = rest_rig.world_matrices(&rest_rig.rest_pose());
        let inverse_bind: Vec<Mat4> = [0usize, 2, 1].iter().map(|&i| world[i].inverse()).collect();

        let rig = Rig::new(nodes, vec![0, 2, 1], inverse_bind);
        for m in rig.joint_palette(&rig.rest_pose()) {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-5));
        }
    }

    #[test]
    fn test_missing_inverse_bind_defaults_to_identity() {
        let rig = Rig::new(chain(), vec![0, 1], vec![]);
        let palette = rig.joint_palette(&rig.rest_pose());
        assert_eq!(palette.len(), 2);
        assert!(palette[0].abs_diff_eq(Mat4::from_translation(Vec3::Y), 1e-6));
    }

    #[test]
    fn test_reset_pose_restores_rest() {
        let rig = Rig::new(chain(), vec![], vec![]);
        let mut pose = rig.rest_pose();
        pose.locals[0].translation = Vec3::splat(9.0);
        rig.reset_pose(&mut pose);
        assert_eq!(pose.locals[0], rig.nodes()[0].rest);
    }
}
