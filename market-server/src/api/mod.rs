//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、登录、当前用户
//! - [`products`] - 商品与评价查询
//! - [`seller`] - 卖家商品与订单
//! - [`cart`] - 买家购物车
//! - [`checkout`] - 下单
//! - [`orders`] - 订单详情、状态流转、物流
//! - [`reviews`] - 评价修改与删除
//! - [`notifications`] - 买家订单通知
//! - [`admin`] - 管理员订单列表
//! - [`pages`] - 页面 (经过访问守卫)

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod pages;
pub mod products;
pub mod reviews;
pub mod seller;

pub use shared::error::{ApiResponse, AppResult};
