use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CONFETTI_PARTICLES: usize = 80;
pub const CONFETTI_GRAVITY: f32 = 0.05;
pub const CONFETTI_RESPAWN_Y: f32 = -10.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub hue: f32,
    pub size: f32,
}

impl Particle {
    fn spawn<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32) -> Self {
        Self {
            x: rng.random::<f32>() * width,
            y: rng.random::<f32>() * height - height,
            vx: rng.random::<f32>() * 6.0 - 3.0,
            vy: rng.random::<f32>() * 4.0 + 3.0,
            hue: rng.random::<f32>() * 360.0,
            size: rng.random::<f32>() * 6.0 + 3.0,
        }
    }

    pub fn color(&self) -> String {
        format!("hsl({}, 100%, 60%)", self.hue.round())
    }
}

/// Falling celebration particles shown after a stage is solved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfettiField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    active: bool,
}

impl ConfettiField {
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.particles = (0..CONFETTI_PARTICLES)
            .map(|_| Particle::spawn(rng, self.width, self.height))
            .collect();
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.particles.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Tracks a canvas resize; live particles keep their positions.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Advances one frame. Particles that fall off the bottom re-enter above
    /// the top edge at a new column.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.active {
            return;
        }
        for particle in &mut self.particles {
            particle.x += particle.vx;
            particle.y += particle.vy;
            particle.vy += CONFETTI_GRAVITY;
            if particle.y > self.height {
                particle.y = CONFETTI_RESPAWN_Y;
                particle.x = rng.random::<f32>() * self.width;
                particle.vy = rng.random::<f32>() * 4.0 + 2.0;
            }
        }
    }
}
